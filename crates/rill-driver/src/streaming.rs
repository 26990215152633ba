use rill_types::TransformDecoder;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::PumpConfig;
use crate::error::DriverError;
use crate::pump::{Next, PumpReport, Session};

/// Asynchronous counterpart of [`pump_transform`](crate::pump_transform).
///
/// Decoding itself never awaits; only the refills and drains between
/// decoder calls do. Backpressure comes for free: no more input is read
/// until the decoder has asked for it with a short read.
///
/// # Example
///
/// ```rust,no_run
/// use rill_decoder::GzipDecoder;
/// use rill_driver::{AsyncPump, PumpConfig};
///
/// # async fn demo() -> Result<(), rill_driver::DriverError> {
/// let input = tokio::fs::File::open("archive.gz").await?;
/// let pump = AsyncPump::new(PumpConfig::default());
/// let report = pump.run(&mut GzipDecoder::new(), input, tokio::io::stdout()).await?;
/// eprintln!("{} bytes", report.bytes_out);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct AsyncPump {
    config: PumpConfig,
}

impl AsyncPump {
    #[must_use]
    pub fn new(config: PumpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Run `decoder` from `input` to `output` until it finishes or fails.
    ///
    /// # Errors
    ///
    /// The same as [`pump_transform`](crate::pump_transform).
    pub async fn run<D, R, W>(
        &self,
        decoder: &mut D,
        mut input: R,
        mut output: W,
    ) -> Result<PumpReport, DriverError>
    where
        D: TransformDecoder + ?Sized,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = Session::new(decoder, &self.config);
        loop {
            let next = session.call(decoder, &self.config);
            output.write_all(session.output()).await?;
            session.output_drained();
            match next? {
                Next::Finished => {
                    output.flush().await?;
                    return Ok(session.report());
                }
                Next::Call => {}
                Next::Refill => {
                    let n = input.read(session.input_spare()).await?;
                    session.input_read(n)?;
                }
            }
        }
    }
}
