use crate::config::Config;
use crate::frame::Frame;
use crate::layout::{format_line, max_content_width, name_column_width};
use crate::signal::Signal;
use crate::stream::Source;
use crate::terminal::{TerminalWidth, WidthSource};
use anyhow::{bail, Result};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

type Streams = Arc<Mutex<Vec<Arc<dyn Source>>>>;

/// Where a render loop draws, and how it learns the width it may use.
struct RenderTarget {
    output: Box<dyn Write + Send>,
    width: Box<dyn WidthSource>,
}

/// Shows the last line of every registered [Source] as a block of rows that is
/// redrawn in place until every stream has closed or the loop is cancelled.
///
/// ```no_run
/// # async fn demo() -> anyhow::Result<()> {
/// use multi_output_status::{Aggregator, Config, Signal, StreamBuffer};
/// use std::sync::Arc;
///
/// let build = Arc::new(StreamBuffer::new("build"));
/// let mut aggregator = Aggregator::with_streams(Config::default(), [build.clone()]);
/// aggregator.begin(Signal::new())?;
///
/// build.write(b"compiling...\n")?;
/// build.close();
///
/// aggregator.done().wait().await;
/// aggregator.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Aggregator {
    config: Config,
    streams: Streams,
    name_width: usize,
    target: Option<RenderTarget>,
    done: Signal,
    stop: Signal,
    task: Option<JoinHandle<()>>,
}

impl Aggregator {
    /// An aggregator drawing to stdout, sized by the controlling terminal.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            streams: Arc::default(),
            name_width: 0,
            target: Some(RenderTarget {
                output: Box::new(io::stdout()),
                width: Box::new(TerminalWidth),
            }),
            done: Signal::new(),
            stop: Signal::new(),
            task: None,
        }
    }

    pub fn with_streams<S: Source + 'static>(
        config: Config,
        streams: impl IntoIterator<Item = Arc<S>>,
    ) -> Self {
        let mut aggregator = Self::new(config);
        aggregator.add(streams);
        aggregator
    }

    /// Draws to `output` instead of stdout. Has no effect once started.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        if let Some(target) = self.target.as_mut() {
            target.output = Box::new(output);
        }
        self
    }

    /// Sizes lines with `width` instead of the controlling terminal. Has no
    /// effect once started.
    pub fn with_width_source(mut self, width: impl WidthSource + 'static) -> Self {
        if let Some(target) = self.target.as_mut() {
            target.width = Box::new(width);
        }
        self
    }

    /// Appends streams in display order.
    ///
    /// Meant to be called before [begin](Self::begin). Streams added later are
    /// still drawn, but the name column keeps the width measured at `begin`, so a
    /// longer name is cut to fit.
    pub fn add<S: Source + 'static>(&mut self, streams: impl IntoIterator<Item = Arc<S>>) {
        lock(&self.streams).extend(streams.into_iter().map(|s| s as Arc<dyn Source>));
    }

    /// Appends one source of any type, for mixing implementations in one block.
    /// Same caveat as [add](Self::add).
    pub fn add_source(&mut self, source: Arc<dyn Source>) {
        lock(&self.streams).push(source);
    }

    pub fn len(&self) -> usize {
        lock(&self.streams).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The name column width frozen by [begin](Self::begin); 0 before that.
    pub fn name_width(&self) -> usize {
        self.name_width
    }

    /// Measures the name column and starts the render loop on a tokio task. Returns
    /// right away. The loop ends when every stream is closed, when [stop](Self::stop)
    /// is called, or when `cancel` is set.
    ///
    /// Call once: an aggregator can't be restarted, and a second call is an error.
    /// Must be called from within a tokio runtime.
    pub fn begin(&mut self, cancel: Signal) -> Result<()> {
        let Some(target) = self.target.take() else {
            bail!("render loop already started");
        };

        self.name_width = name_column_width(lock(&self.streams).iter().map(|s| s.name()));
        log::debug!(
            "starting render loop: {} streams, name width {}, interval {:?}",
            self.len(),
            self.name_width,
            self.config.refresh_interval
        );

        let render_loop = RenderLoop {
            config: self.config,
            streams: self.streams.clone(),
            name_width: self.name_width,
            target,
            done: self.done.clone(),
            stop: self.stop.clone(),
            cancel,
        };
        self.task = Some(tokio::spawn(render_loop.run()));
        Ok(())
    }

    /// Set once a render pass has seen every stream closed.
    pub fn done(&self) -> Signal {
        self.done.clone()
    }

    /// Asks the render loop to finish and waits until it has. Nothing is written
    /// to the output after this returns. Does nothing if the loop never started
    /// or was already stopped.
    pub async fn stop(&mut self) -> Result<()> {
        self.stop.set();
        if let Some(task) = self.task.take() {
            task.await?;
            log::debug!("render loop joined");
        }
        Ok(())
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.stop.set();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct RenderLoop {
    config: Config,
    streams: Streams,
    name_width: usize,
    target: RenderTarget,
    done: Signal,
    stop: Signal,
    cancel: Signal,
}

impl RenderLoop {
    async fn run(mut self) {
        let mut erase = 0;
        loop {
            let drawn = match self.pass(erase) {
                Pass::Complete => {
                    self.done.set();
                    log::debug!("all streams closed");
                    return;
                }
                Pass::Drawn(lines) => lines,
            };

            tokio::select! {
                biased;
                _ = self.stop.wait() => {
                    log::debug!("render loop stopped");
                    return;
                }
                _ = self.cancel.wait() => {
                    log::debug!("render loop cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.config.refresh_interval) => erase = drawn,
            }
        }
    }

    /// Erases the previous block, then draws every stream once.
    fn pass(&mut self, erase: usize) -> Pass {
        let streams = lock(&self.streams).clone();
        let terminal_width = self
            .target
            .width
            .columns()
            .unwrap_or(self.config.fallback_width);
        let name_width = self.name_width;
        let max_width = max_content_width(terminal_width.into(), name_width);

        let mut frame = Frame::new(&mut self.target.output);
        let mut closed = 0;
        let written = frame.erase(erase).and_then(|frame| {
            for stream in &streams {
                // Closed first: a line read after seeing the close is final.
                if stream.is_closed() {
                    closed += 1;
                }
                frame.line(&format_line(
                    stream.name(),
                    &stream.last_line(),
                    name_width,
                    max_width,
                ));
            }
            frame.render()
        });
        if let Err(err) = written {
            log::warn!("failed to draw status block: {err:#}");
        }
        log::trace!("drew {} lines, {closed} closed", streams.len());

        if closed == streams.len() {
            Pass::Complete
        } else {
            Pass::Drawn(streams.len())
        }
    }
}

enum Pass {
    /// Every stream was closed; the block stays on screen.
    Complete,
    /// Lines drawn this pass, to be erased before the next one.
    Drawn(usize),
}

fn lock(streams: &Streams) -> MutexGuard<'_, Vec<Arc<dyn Source>>> {
    streams.lock().unwrap_or_else(PoisonError::into_inner)
}
