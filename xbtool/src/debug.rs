use tracing_subscriber::EnvFilter;

#[derive(clap::Args, Debug, Clone)]
pub struct DebugArgs {
    /// Log more. Repeat up to three times to also dump raw traffic.
    #[arg(short, long, action=clap::ArgAction::Count)]
    pub debug: u8,
}

impl DebugArgs {
    fn level(&self) -> &'static str {
        match self.debug {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Log to stderr. `RUST_LOG` overrides the `-d` count.
    pub fn init_logging(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Wrap one half of a port, so `-ddd` dumps what crosses it.
    pub fn wrap<F>(&self, port: F, prefix: &'static str) -> DebugPort<F> {
        DebugPort {
            inner: port,
            dump: self.debug >= 3,
            prefix,
        }
    }
}

pub struct DebugPort<F> {
    inner: F,
    dump: bool,
    // ">>>" for traffic we write, "<<<" for traffic we read
    prefix: &'static str,
}

impl<F> DebugPort<F> {
    fn show(&self, data: &[u8]) {
        if self.dump && !data.is_empty() {
            eprintln!("{} raw:", self.prefix);
            crate::hexdump::ehexdump_prefix(&format!("{}   ", self.prefix), data);
        }
    }
}

impl<F> std::io::Read for DebugPort<F>
where
    F: std::io::Read,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let amt = self.inner.read(buf)?;
        self.show(&buf[..amt]);
        Ok(amt)
    }
}

impl<F> std::io::Write for DebugPort<F>
where
    F: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let amt = self.inner.write(buf)?;
        self.show(&buf[..amt]);
        Ok(amt)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
