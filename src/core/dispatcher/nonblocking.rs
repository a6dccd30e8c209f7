cfg_async! {
    use super::Dispatcher;
    use crate::{
        base::{CallOutcome, DispatchResult, RejectReason},
        logging, Result,
    };
    use std::sync::Arc;

    impl Dispatcher {
        /// `invoke_async` runs the same guarded call as `invoke` on tokio's blocking pool,
        /// so a blocking collaborator SDK never stalls the async executor.
        ///
        /// The call is owned by the pool once spawned: if the returned future is dropped,
        /// `work` still completes and its outcome is still recorded.
        /// An unknown name fails before anything is spawned.
        ///
        /// If the runtime shuts down before the call starts, `work` never runs and the
        /// outcome is `Rejected(Overloaded)`: the endpoint had no capacity left to take it.
        /// Nothing is recorded on the circuit in that case.
        pub async fn invoke_async<T, F>(
            self: &Arc<Self>,
            name: &str,
            work: F,
        ) -> DispatchResult<CallOutcome<T>>
        where
            T: Send + 'static,
            F: FnOnce() -> Result<T> + Send + 'static,
        {
            let slot = self.slot(name)?;
            let dispatcher = Arc::clone(self);
            let handle = tokio::task::spawn_blocking(move || dispatcher.invoke_slot(&slot, work));
            match handle.await {
                Ok(outcome) => Ok(outcome),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => {
                    // the runtime shut down before the call started, nothing was attempted
                    logging::debug!("[Dispatcher] Call to endpoint {} cancelled: {}", name, err);
                    Ok(CallOutcome::Rejected(RejectReason::Overloaded))
                }
            }
        }
    }
}
