use data_encoding::BASE32;
use serde_derive::Serialize;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;

pub fn compute_digest<R: Read>(input: &mut R) -> std::io::Result<String> {
    let sha1 = Sha1::new();

    let mut buffered = BufWriter::new(sha1);
    std::io::copy(input, &mut buffered)?;

    let result = buffered.into_inner()?.finalize();

    let mut output = String::new();
    BASE32.encode_append(&result, &mut output);

    Ok(output)
}

/// A written file and the digest of its contents.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FileDigest {
    pub path: String,
    pub digest: String,
}

impl FileDigest {
    pub fn compute<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut file = File::open(path.as_ref())?;

        Ok(FileDigest {
            path: path.as_ref().to_string_lossy().into_owned(),
            digest: compute_digest(&mut file)?,
        })
    }
}
