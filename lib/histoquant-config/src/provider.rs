use std::path::Path;

use figment::{
    providers::{Data, Json, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// Supported configuration file formats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    fn name(&self) -> &'static str {
        match self {
            FileFormat::Yaml => "YAML file",
            FileFormat::Json => "JSON file",
        }
    }
}

/// A provider whose data has been read and parsed eagerly from a file.
///
/// Parsing up front means that a malformed file is reported when it is added to the loader, rather than when the
/// configuration is first queried.
pub struct FileProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl FileProvider {
    pub fn from_path<P>(format: FileFormat, path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| e.to_string())?;
        let data = match format {
            FileFormat::Yaml => Data::<Yaml>::string(&contents).data()?,
            FileFormat::Json => Data::<Json>::string(&contents).data()?,
        };

        Ok(Self {
            data,
            metadata: Metadata::from(format.name(), path.as_ref()),
        })
    }
}

impl Provider for FileProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
