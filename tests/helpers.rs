// Shared test helpers: fake resolver, recording writer and log file utilities.
//
// This module provides common utilities used across multiple test files to reduce duplication.

#![allow(dead_code)] // Each test binary uses a different subset

use std::collections::HashSet;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geostat::{
    build_point, CityFields, GeoPoint, LookupError, PointWriter, Resolver, SchemaError, WriteError,
};

/// Resolver that places every address in Mountain View, except `unknown` ones.
#[derive(Default)]
pub struct FakeResolver {
    pub unknown: HashSet<Ipv4Addr>,
}

impl FakeResolver {
    pub fn with_unknown(ips: &[Ipv4Addr]) -> Self {
        FakeResolver {
            unknown: ips.iter().copied().collect(),
        }
    }
}

impl Resolver for FakeResolver {
    fn resolve(&self, ip: Ipv4Addr) -> Result<GeoPoint, LookupError> {
        if self.unknown.contains(&ip) {
            return Err(LookupError::NotFound(ip.to_string()));
        }
        let fields = CityFields {
            city_name: Some("Mountain View".to_string()),
            country_name: Some("United States".to_string()),
            country_code: Some("US".to_string()),
            latitude: Some(37.386),
            longitude: Some(-122.0838),
        };
        build_point(ip, fields, "test-host".to_string(), 12)
    }
}

/// How the recording writer answers each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Accept,
    Reject,
    SchemaFailure,
}

/// Writer that records accepted batches. Answers are consumed in order;
/// once exhausted every write is accepted.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub batches: Arc<Mutex<Vec<Vec<GeoPoint>>>>,
    pub attempts: Arc<Mutex<usize>>,
    answers: Arc<Mutex<Vec<Answer>>>,
}

impl RecordingWriter {
    pub fn with_answers(answers: &[Answer]) -> Self {
        let writer = RecordingWriter::default();
        writer
            .answers
            .lock()
            .unwrap()
            .extend(answers.iter().rev().copied());
        writer
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn written(&self) -> Vec<GeoPoint> {
        self.batches.lock().unwrap().concat()
    }
}

impl PointWriter for RecordingWriter {
    async fn write(&mut self, batch: &[GeoPoint]) -> Result<(), WriteError> {
        *self.attempts.lock().unwrap() += 1;
        let answer = self.answers.lock().unwrap().pop().unwrap_or(Answer::Accept);
        match answer {
            Answer::Accept => {
                self.batches.lock().unwrap().push(batch.to_vec());
                Ok(())
            }
            Answer::Reject => Err(WriteError::Rejected {
                status: 503,
                body: "store unavailable".to_string(),
            }),
            Answer::SchemaFailure => Err(WriteError::Schema(SchemaError::Rejected {
                statement: "CREATE DATABASE \"geostat\"".to_string(),
                status: 403,
                body: "forbidden".to_string(),
            })),
        }
    }
}

/// Appends `lines` to `path`, each terminated by a newline.
pub fn append_lines(path: &Path, lines: &[&str]) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("Failed to open log file for append");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to append line");
    }
}

/// Polls `condition` every 10ms for up to 5 seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
