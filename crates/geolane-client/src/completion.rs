//! Callback-style completion for any result-returning future.

use std::future::Future;

/// Boxed completion handler, for callers that store or pass handlers around.
pub type Completion<T, E> = Box<dyn FnOnce(Result<&T, &E>) + Send>;

/// Await `future`, then hand its outcome to `handler` if one was given.
///
/// The handler runs exactly once, with `Ok` or `Err`. The result is
/// returned unchanged either way, so the call still composes as a future.
pub async fn with_completion<T, E, Fut, H>(future: Fut, handler: Option<H>) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    H: FnOnce(Result<&T, &E>),
{
    let result = future.await;
    if let Some(handler) = handler {
        handler(result.as_ref());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<Result<i32, String>>>>;

    fn recording(calls: &Calls) -> impl FnOnce(Result<&i32, &String>) {
        let calls = calls.clone();
        move |outcome| {
            calls
                .lock()
                .unwrap()
                .push(outcome.map(|v| *v).map_err(|e| e.clone()));
        }
    }

    #[tokio::test]
    async fn test_success_invokes_handler_once() {
        let calls = Calls::default();
        let result = with_completion(async { Ok::<_, String>(5) }, Some(recording(&calls))).await;

        assert_eq!(result, Ok(5));
        assert_eq!(*calls.lock().unwrap(), vec![Ok(5)]);
    }

    #[tokio::test]
    async fn test_failure_invokes_handler_once() {
        let calls = Calls::default();
        let result =
            with_completion(async { Err::<i32, _>("offline".to_string()) }, Some(recording(&calls)))
                .await;

        assert_eq!(result, Err("offline".to_string()));
        assert_eq!(*calls.lock().unwrap(), vec![Err("offline".to_string())]);
    }

    #[tokio::test]
    async fn test_no_handler_returns_result() {
        let result = with_completion(async { Ok::<_, String>(1) }, None::<Completion<i32, String>>).await;
        assert_eq!(result, Ok(1));
    }

    #[tokio::test]
    async fn test_boxed_handler() {
        let calls = Calls::default();
        let handler: Completion<i32, String> = Box::new(recording(&calls));
        let _ = with_completion(async { Ok::<_, String>(9) }, Some(handler)).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
    }
}
