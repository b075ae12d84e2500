//! Fixture archives for tests.

use std::io;
use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

pub struct Entry {
    name: &'static str,
    data: Option<&'static [u8]>,
}

impl Entry {
    pub fn dir(name: &'static str) -> Self {
        Self { name, data: None }
    }

    pub fn file(name: &'static str, data: &'static [u8]) -> Self {
        Self {
            name,
            data: Some(data),
        }
    }
}

pub fn tar_gz_bytes(entries: &[Entry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        match entry.data {
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, entry.name, io::empty())
                    .unwrap();
            }
            Some(data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o755);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, entry.name, data).unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn zip_bytes(entries: &[Entry]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for entry in entries {
        match entry.data {
            None => zip.add_directory(entry.name, options).unwrap(),
            Some(data) => {
                zip.start_file(entry.name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
    }
    zip.finish().unwrap().into_inner()
}
