use bridge::HostHandler;
use protocol::HostCommand;
use serde_json::Value;
use tokio::sync::mpsc;

/// The bridge's host command handler.
///
/// Acknowledges each command straight away and queues it for the controller.
#[derive(Clone)]
pub struct CommandForwarder {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl CommandForwarder {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HostHandler for CommandForwarder {
    fn handle(&self, command: HostCommand) -> Value {
        let ack = command.ack();
        if let Err(e) = self.tx.send(command) {
            tracing::warn!(command = ?e.0, "controller gone, dropping host command");
        }
        ack
    }
}
