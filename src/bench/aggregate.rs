use typed_index_collections::TiVec;

use super::{DuplicateResult, Error, MissingResult, TaskId, TaskResult, UnknownTask};
use crate::prelude::*;

/// Merges the collected result records into one summary ordered by
/// task id.
///
/// Exactly one result per submitted task is required; a missing or
/// duplicated id is a coordination bug and fails the whole run rather
/// than becoming a verdict.
pub fn aggregate(num_tasks: usize, mut results: Vec<TaskResult>) -> Result<Vec<TaskResult>, Error> {
    let mut seen: TiVec<TaskId, bool> = vec![false; num_tasks].into();

    for result in &results {
        let slot = seen
            .get_mut(result.id)
            .context(UnknownTask { id: result.id })?;
        ensure!(!*slot, DuplicateResult { id: result.id });
        *slot = true;
    }

    if let Some((id, _)) = seen.iter_enumerated().find(|(_, &reported)| !reported) {
        return MissingResult { id }.fail();
    }

    results.sort_by_key(|result| result.id);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bench::Verdict;

    fn result(id: usize) -> TaskResult {
        TaskResult {
            id: TaskId::from(id),
            verdict: Verdict::Unsat,
            elapsed: Duration::from_millis(1),
            model: None,
            diagnostic: None,
        }
    }

    #[test]
    fn orders_by_task_id() {
        let merged = aggregate(3, vec![result(2), result(0), result(1)]).unwrap();
        let ids: Vec<usize> = merged.iter().map(|result| result.id.into()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_duplicate() {
        let error = aggregate(2, vec![result(0), result(1), result(1)]).unwrap_err();
        assert!(matches!(error, Error::DuplicateResult { .. }));
    }

    #[test]
    fn rejects_missing() {
        let error = aggregate(3, vec![result(0), result(2)]).unwrap_err();
        assert!(matches!(error, Error::MissingResult { .. }));
    }

    #[test]
    fn rejects_unknown() {
        let error = aggregate(1, vec![result(0), result(5)]).unwrap_err();
        assert!(matches!(error, Error::UnknownTask { .. }));
    }

    #[test]
    fn empty_run() {
        assert!(aggregate(0, Vec::new()).unwrap().is_empty());
    }
}
