use tokio::sync::broadcast;

/// Fan-out of the operator interrupt. One message ends the active run.
pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;
