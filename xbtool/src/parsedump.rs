use xblib::protocol::{DecodeResult, FrameDecoder};

#[derive(clap::Args, Debug)]
pub struct ParseDumpOpts {
    /// A capture of raw serial traffic.
    dump: String,
    /// The capture is hex text, like `7E 00 04 08 01 41 50 65`.
    #[arg(long)]
    hex: bool,
}

/// Decode hex text, ignoring whitespace, commas, and `0x` prefixes.
fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let mut digits = String::new();
    for token in text.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits += token;
    }
    anyhow::ensure!(digits.len() % 2 == 0, "odd number of hex digits");

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = digits
                .get(i..i + 2)
                .ok_or_else(|| anyhow::anyhow!("bad hex near offset {}", i))?;
            u8::from_str_radix(pair, 16).map_err(|e| anyhow::anyhow!("bad hex {:?}: {}", pair, e))
        })
        .collect()
}

#[derive(Debug, Default)]
struct Counts {
    frames: usize,
    checksum_errors: usize,
    parse_errors: usize,
    skipped: usize,
}

impl crate::ToolRun for ParseDumpOpts {
    fn run(&self) -> anyhow::Result<()> {
        let rawdata = if self.hex {
            parse_hex(&std::fs::read_to_string(&self.dump)?)?
        } else {
            std::fs::read(&self.dump)?
        };

        let mut decoder = FrameDecoder::new();
        let mut counts = Counts::default();

        // feed in port-sized pieces, so skipped bytes stay near the
        // frames they came between
        for chunk in rawdata.chunks(256) {
            for result in decoder.feed(chunk) {
                match result {
                    DecodeResult::Ok(frame) => {
                        counts.frames += 1;
                        println!("{:?}", frame);
                        println!();
                    }
                    DecodeResult::ChecksumErr(raw) => {
                        counts.checksum_errors += 1;
                        println!("!!! checksum error:");
                        crate::hexdump::hexdump_prefix("!!!   ", &raw);
                        println!();
                    }
                    DecodeResult::ParseErr(raw, kind) => {
                        counts.parse_errors += 1;
                        println!("!!! parse error: {:?}", kind);
                        crate::hexdump::hexdump_prefix("!!!   ", &raw);
                        println!();
                    }
                }
            }

            let skipped = decoder.take_discarded();
            if !skipped.is_empty() {
                counts.skipped += skipped.len();
                println!("skipped {} bytes:", skipped.len());
                crate::hexdump::hexdump_prefix("      ", &skipped);
                println!();
            }
        }

        if decoder.buffered() > 0 {
            println!("{} bytes of an incomplete frame at the end", decoder.buffered());
        }
        println!(
            "{} frames, {} checksum errors, {} parse errors, {} bytes skipped",
            counts.frames, counts.checksum_errors, counts.parse_errors, counts.skipped
        );
        Ok(())
    }
}
