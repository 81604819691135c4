//! Inbound command validation.
//!
//! Runs on the host's dispatch path, so it only validates and enqueues:
//! no I/O and no waiting.

use tokio::sync::mpsc;

use twinbridge_domain::capability::ActionDescriptor;
use twinbridge_domain::error::ValidationError;
use twinbridge_domain::event::ActionRequest;

/// Checks requests against the declared actions and forwards the valid ones.
#[derive(Debug)]
pub struct CommandHandler {
    actions: Vec<ActionDescriptor>,
    accepted: mpsc::Sender<ActionRequest>,
}

impl CommandHandler {
    pub fn new(actions: Vec<ActionDescriptor>, accepted: mpsc::Sender<ActionRequest>) -> Self {
        Self { actions, accepted }
    }

    /// Check `request` without any side effect.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownAction`] when the key is not
    /// declared, and [`ValidationError::BodyKindMismatch`] when the body is
    /// not of the declared kind.
    pub fn validate(&self, request: &ActionRequest) -> Result<(), ValidationError> {
        let action = self
            .actions
            .iter()
            .find(|action| action.key == request.key)
            .ok_or_else(|| ValidationError::UnknownAction {
                key: request.key.clone(),
            })?;

        let actual = request.body.kind();
        if actual != action.body_kind {
            return Err(ValidationError::BodyKindMismatch {
                key: request.key.clone(),
                expected: action.body_kind,
                actual,
            });
        }
        Ok(())
    }

    /// Validate `request` and, if accepted, hand it over for actuation.
    ///
    /// A full or abandoned queue is logged; the request is still considered
    /// valid.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] from [`validate`](Self::validate);
    /// nothing is enqueued in that case.
    pub fn handle(&self, request: ActionRequest) -> Result<(), ValidationError> {
        self.validate(&request)?;
        tracing::info!(key = %request.key, body = %request.body, "action request accepted");

        match self.accepted.try_send(request) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(request)) => {
                tracing::warn!(key = %request.key, "action queue full, request not forwarded");
            }
            Err(mpsc::error::TrySendError::Closed(request)) => {
                tracing::debug!(key = %request.key, "no actuator listening, request not forwarded");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{self, SET_TEMPERATURE_ACTION_KEY};
    use twinbridge_domain::value::{Value, ValueKind};

    fn handler(buffer: usize) -> (CommandHandler, mpsc::Receiver<ActionRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        let actions = capabilities::describe().unwrap().actions().to_vec();
        (CommandHandler::new(actions, tx), rx)
    }

    #[test]
    fn should_accept_float_set_temperature() {
        let (handler, mut rx) = handler(4);
        let request = ActionRequest::new(SET_TEMPERATURE_ACTION_KEY, 22.5);

        assert!(handler.handle(request.clone()).is_ok());
        assert_eq!(rx.try_recv().unwrap(), request);
    }

    #[test]
    fn should_reject_non_numeric_body_without_side_effect() {
        let (handler, mut rx) = handler(4);
        let result = handler.handle(ActionRequest::new(SET_TEMPERATURE_ACTION_KEY, "hot"));

        assert_eq!(
            result,
            Err(ValidationError::BodyKindMismatch {
                key: SET_TEMPERATURE_ACTION_KEY.to_string(),
                expected: ValueKind::Float,
                actual: ValueKind::String,
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_reject_integer_body() {
        let (handler, _rx) = handler(4);
        let result = handler.validate(&ActionRequest::new(
            SET_TEMPERATURE_ACTION_KEY,
            Value::Int(22),
        ));
        assert!(matches!(result, Err(ValidationError::BodyKindMismatch { .. })));
    }

    #[test]
    fn should_reject_unknown_action_without_side_effect() {
        let (handler, mut rx) = handler(4);
        let result = handler.handle(ActionRequest::new("open-window-action-key", 1.0));

        assert_eq!(
            result,
            Err(ValidationError::UnknownAction {
                key: "open-window-action-key".to_string(),
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_not_fail_when_queue_is_full() {
        let (handler, mut rx) = handler(1);
        handler
            .handle(ActionRequest::new(SET_TEMPERATURE_ACTION_KEY, 21.0))
            .unwrap();
        assert!(
            handler
                .handle(ActionRequest::new(SET_TEMPERATURE_ACTION_KEY, 23.0))
                .is_ok()
        );

        assert_eq!(rx.try_recv().unwrap().body, Value::Float(21.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn should_not_fail_when_receiver_is_gone() {
        let (handler, rx) = handler(1);
        drop(rx);
        assert!(
            handler
                .handle(ActionRequest::new(SET_TEMPERATURE_ACTION_KEY, 21.0))
                .is_ok()
        );
    }
}
