//! Station and network dataset ingestion
//!
//! Two CSV files describe a railway: `stations.csv` lists every station with
//! its administrative location, `network.csv` lists rail segments between
//! stations with a capacity and a service tier. Loading both yields a
//! `StationDirectory` for group lookups and a ready `RailNetwork`.

pub mod parser;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data_structures::graph::Capacity;
use crate::data_structures::rail::RailNetwork;

use self::parser::{parse_service, split_record};

/// Errors raised while reading a dataset
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Read failure: {0}")]
    Read(#[from] io::Error),

    #[error("Malformed {file} row at line {line}")]
    MalformedRow { file: &'static str, line: usize },

    #[error("Unknown service '{service}' at line {line}")]
    UnknownService { line: usize, service: String },

    #[error("Invalid capacity '{value}' at line {line}")]
    BadCapacity { line: usize, value: String },

    #[error("Rail at line {line} joins unknown stations {origin} and {destination}")]
    UnknownEndpoint {
        line: usize,
        origin: String,
        destination: String,
    },

    #[error("Unknown grouping '{0}', expected district, municipality or township")]
    UnknownGroupKind(String),
}

/// One row of the station file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub district: String,
    pub municipality: String,
    pub township: String,
    pub line: String,
}

/// Administrative level used to group stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    District,
    Municipality,
    Township,
}

impl GroupKind {
    fn key(self, station: &Station) -> &str {
        match self {
            GroupKind::District => &station.district,
            GroupKind::Municipality => &station.municipality,
            GroupKind::Township => &station.township,
        }
    }
}

impl FromStr for GroupKind {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "district" => Ok(GroupKind::District),
            "municipality" => Ok(GroupKind::Municipality),
            "township" => Ok(GroupKind::Township),
            _ => Err(DatasetError::UnknownGroupKind(s.to_owned())),
        }
    }
}

/// Stations in declaration order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
}

impl StationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a station; false if the name is already taken
    pub fn insert(&mut self, station: Station) -> bool {
        if self.index.contains_key(&station.name) {
            return false;
        }
        self.index.insert(station.name.clone(), self.stations.len());
        self.stations.push(station);
        true
    }

    pub fn find_station(&self, name: &str) -> Option<&Station> {
        self.index.get(name).map(|&i| &self.stations[i])
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Station names per group; stations with a blank key are left out
    pub fn groups(&self, kind: GroupKind) -> HashMap<String, Vec<String>> {
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for station in &self.stations {
            let key = kind.key(station);
            if key.is_empty() {
                continue;
            }
            groups.entry(key.to_owned()).or_default().push(station.name.clone());
        }
        groups
    }

    pub fn by_district(&self) -> HashMap<String, Vec<String>> {
        self.groups(GroupKind::District)
    }

    pub fn by_municipality(&self) -> HashMap<String, Vec<String>> {
        self.groups(GroupKind::Municipality)
    }

    pub fn by_township(&self) -> HashMap<String, Vec<String>> {
        self.groups(GroupKind::Township)
    }
}

/// A loaded railway: station metadata plus its flow network
#[derive(Debug, Clone)]
pub struct Dataset {
    pub directory: StationDirectory,
    pub network: RailNetwork,
}

impl Dataset {
    /// Reads both files from disk
    pub fn load(stations: impl AsRef<Path>, network: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let dataset = Self::from_readers(open(stations.as_ref())?, open(network.as_ref())?)?;
        info!(
            "Loaded {} stations and {} rails",
            dataset.network.station_count(),
            dataset.network.rail_count()
        );
        Ok(dataset)
    }

    /// Parses both files; the first line of each is a header
    pub fn from_readers(stations: impl BufRead, network: impl BufRead) -> Result<Self, DatasetError> {
        let mut directory = StationDirectory::new();
        let mut rails = RailNetwork::new();

        for (index, line) in stations.lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let station = parse_station(&line, index + 1)?;
            rails.add_station(&station.name);
            if !directory.insert(station) {
                debug!("Ignoring duplicate station at line {}", index + 1);
            }
        }

        for (index, line) in network.lines().enumerate().skip(1) {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            add_rail(&mut rails, &line, index + 1)?;
        }

        Ok(Self {
            directory,
            network: rails,
        })
    }
}

fn open(path: &Path) -> Result<BufReader<File>, DatasetError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_station(line: &str, number: usize) -> Result<Station, DatasetError> {
    let fields = split_record(line);
    let [name, district, municipality, township, rail_line]: [String; 5] =
        fields.try_into().map_err(|_| DatasetError::MalformedRow {
            file: "stations",
            line: number,
        })?;
    if name.is_empty() {
        return Err(DatasetError::MalformedRow {
            file: "stations",
            line: number,
        });
    }
    Ok(Station {
        name,
        district,
        municipality,
        township,
        line: rail_line,
    })
}

fn add_rail(rails: &mut RailNetwork, line: &str, number: usize) -> Result<(), DatasetError> {
    let fields = split_record(line);
    let [origin, destination, capacity, service]: [String; 4] =
        fields.try_into().map_err(|_| DatasetError::MalformedRow {
            file: "network",
            line: number,
        })?;

    let capacity: Capacity = capacity.parse().map_err(|_| DatasetError::BadCapacity {
        line: number,
        value: capacity.clone(),
    })?;
    let service = parse_service(&service).ok_or_else(|| DatasetError::UnknownService {
        line: number,
        service: service.clone(),
    })?;

    rails
        .add_rail(&origin, &destination, capacity, service)
        .ok_or(DatasetError::UnknownEndpoint {
            line: number,
            origin,
            destination,
        })?;
    Ok(())
}
