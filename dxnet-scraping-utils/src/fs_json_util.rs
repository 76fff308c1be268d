use std::{
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context;
use fs_err::File;
use serde::{Deserialize, Serialize};

pub fn read_json<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| {
        format!(
            "While parsing {path:?} as {}",
            std::any::type_name::<T>()
        )
    })
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> anyhow::Result<()> {
    let file = File::create(path.as_ref())?;
    serde_json::to_writer(BufWriter::new(file), value)?;
    Ok(())
}
