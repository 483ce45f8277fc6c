//! Binary portable bitmap (`P4`) output.

use std::{fs::File, io::BufWriter, io::Write, path::Path};

use log::debug;

use crate::{bitmap::Bitmap, error::Result};

pub fn write<W: Write>(bitmap: &Bitmap, mut writer: W) -> Result<()> {
    write!(writer, "P4\n{} {}\n", bitmap.dim(), bitmap.dim())?;
    writer.write_all(bitmap.as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn save(bitmap: &Bitmap, path: &Path) -> Result<()> {
    debug!("writing {} bytes to {}", bitmap.as_bytes().len(), path.display());
    write(bitmap, BufWriter::new(File::create(path)?))
}
