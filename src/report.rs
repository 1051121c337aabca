/*!
Custom Snafu error printer

Returned from `main` so a failed run prints the full source chain
instead of the default `Debug` dump.
*/

use std::error::Error as StdError;

pub struct Report(Box<dyn StdError>);

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)?;

        let mut source = self.0.source();
        let mut depth = 0;
        while let Some(error) = source {
            if depth == 0 {
                writeln!(f, "\nCaused by:")?;
            }
            writeln!(f, "  {}: {}", depth, error)?;
            source = error.source();
            depth += 1;
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}
