use crate::core::error::Result;
use crate::core::fs::is_bgzipped;
use flate2::read::MultiGzDecoder;
use grep_cli::stdout;
use gzp::{deflate::Bgzf, Compression, ZBuilder};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use termcolor::ColorChoice;

fn is_stdio<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref() == Path::new("-")
}

/// Open a line-oriented text source, transparently decompressing gzip/BGZF input.
///
/// A path of `-` reads from stdin.
pub fn get_line_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    if is_stdio(path) {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }

    let file = File::open(path)?;
    if is_bgzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Build a raw writer targeting a file or stdout with optional BGZF compression.
pub fn get_raw_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    threads: usize,
    compression_level: u32,
) -> Result<Box<dyn Write>> {
    let raw_writer: Box<dyn Write> = match path {
        Some(path) if !is_stdio(path) => {
            let writer = BufWriter::new(File::create(path)?);
            if gzipped {
                Box::new(
                    ZBuilder::<Bgzf, _>::new()
                        .num_threads(threads)
                        .compression_level(Compression::new(compression_level))
                        .from_writer(writer),
                )
            } else {
                Box::new(writer)
            }
        }
        _ => {
            let writer = stdout(ColorChoice::Never);
            if gzipped {
                Box::new(
                    ZBuilder::<Bgzf, _>::new()
                        .num_threads(threads)
                        .compression_level(Compression::new(compression_level))
                        .from_writer(writer),
                )
            } else {
                Box::new(writer)
            }
        }
    };
    Ok(raw_writer)
}

/// Build a tab-delimited CSV writer targeting a file or stdout with optional BGZF compression.
pub fn get_writer<P: AsRef<Path>>(
    path: &Option<P>,
    gzipped: bool,
    write_headers: bool,
    threads: usize,
    compression_level: u32,
) -> Result<csv::Writer<Box<dyn Write>>> {
    let raw_writer = get_raw_writer(path, gzipped, threads, compression_level)?;

    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(write_headers)
        .from_writer(raw_writer))
}
