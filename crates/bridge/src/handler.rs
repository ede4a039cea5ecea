use protocol::HostCommand;
use serde_json::Value;

/// The single global dispatcher for host commands.
///
/// Called on the bridge's reader task, so it must answer immediately. Real
/// work belongs on the controller, reached through a channel.
pub trait HostHandler: Send + Sync + 'static {
    fn handle(&self, command: HostCommand) -> Value;
}

impl<F> HostHandler for F
where
    F: Fn(HostCommand) -> Value + Send + Sync + 'static,
{
    fn handle(&self, command: HostCommand) -> Value {
        self(command)
    }
}
