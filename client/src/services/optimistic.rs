//! Apply locally, confirm or revert
//!
//! Quick toggles change local state before the server answers. On
//! success the server's record replaces the local one; on failure the
//! local state is rebuilt from the server and the error is returned.

use crate::error::Result;
use std::future::Future;

/// Run one optimistic mutation.
///
/// `apply` runs before `remote` is awaited. Exactly one of `confirm` and
/// `revert` runs afterwards. A failing revert is logged; the caller
/// always gets the remote error.
pub async fn run<T, Remote, Revert>(
    label: &str,
    apply: impl FnOnce(),
    remote: Remote,
    confirm: impl FnOnce(&T),
    revert: impl FnOnce() -> Revert,
) -> Result<T>
where
    Remote: Future<Output = Result<T>>,
    Revert: Future<Output = Result<()>>,
{
    apply();

    match remote.await {
        Ok(value) => {
            confirm(&value);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Optimistic {} failed, reverting: {}", label, e);
            if let Err(revert_err) = revert().await {
                tracing::error!("Revert after failed {} also failed: {}", label, revert_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_success_confirms_without_revert() {
        let log = Mutex::new(Vec::new());

        let value = run(
            "pin",
            || log.lock().unwrap().push("apply"),
            async {
                log.lock().unwrap().push("remote");
                Ok(7)
            },
            |v: &i32| log.lock().unwrap().push(if *v == 7 { "confirm" } else { "?" }),
            || async {
                log.lock().unwrap().push("revert");
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(*log.lock().unwrap(), vec!["apply", "remote", "confirm"]);
    }

    #[tokio::test]
    async fn test_failure_reverts_and_returns_remote_error() {
        let log = Mutex::new(Vec::new());

        let result: Result<()> = run(
            "tag",
            || log.lock().unwrap().push("apply"),
            async { Err(AppError::Generic("offline".to_string())) },
            |_| log.lock().unwrap().push("confirm"),
            || async {
                log.lock().unwrap().push("revert");
                Err(AppError::Generic("still offline".to_string()))
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Generic(ref m)) if m == "offline"));
        assert_eq!(*log.lock().unwrap(), vec!["apply", "revert"]);
    }
}
