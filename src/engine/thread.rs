use crate::errors::ShutdownError;

struct EngineThreadInner {
	thread: std::thread::JoinHandle<()>,
	shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

/// A dedicated thread driving an engine on a current-thread Tokio runtime.
pub(crate) struct EngineThread(Option<EngineThreadInner>);
impl EngineThread {
	pub(crate) fn spawn<F>(name: &str, run: F) -> Result<Self, std::io::Error>
	where
		F: FnOnce(tokio::runtime::Runtime, tokio::sync::oneshot::Receiver<()>) + Send + 'static,
	{
		let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
		let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

		let thread = std::thread::Builder::new()
			.name(name.to_owned())
			.spawn(move || run(runtime, shutdown_rx))?;

		Ok(Self(Some(EngineThreadInner { thread, shutdown_tx })))
	}

	pub(crate) fn shutdown(&mut self) -> Result<(), ShutdownError> {
		let EngineThreadInner { thread, shutdown_tx } = match self.0.take() {
			Some(inner) => inner,
			None => return Ok(()),
		};

		if !thread.is_finished() {
			shutdown_tx.send(()).ok();
		}

		// Dropped from a reply handler, i.e. on the engine thread itself
		if thread.thread().id() == std::thread::current().id() {
			return Ok(());
		}

		thread.join().map_err(ShutdownError::ThreadJoinError)
	}
}
impl Drop for EngineThread {
	fn drop(&mut self) {
		if let Err(err) = self.shutdown() {
			log::error!("{err}");
		}
	}
}
