use std::path::{Path, PathBuf};

// Configuration structure for column name mapping
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub key: String,
    pub order: String,
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig {
            key: "COMID".to_string(),
            order: "order".to_string(),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Which identifier values count as "missing" on the headwater record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    /// null, 0, empty text and `false` are all missing
    #[default]
    Falsy,
    /// only null (or NaN / blank text) is missing; 0 is a real identifier
    NullOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    River,
    Basin,
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::River => "river",
            Layer::Basin => "basin",
        }
    }
}

// Input and output locations for one fabric code
#[derive(Debug, Clone)]
pub struct FabricPaths {
    pub fabric_code: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl FabricPaths {
    pub fn new(fabric_code: &str, input_root: &Path, output_root: &Path) -> Self {
        FabricPaths {
            fabric_code: fabric_code.to_string(),
            input_dir: input_root.join(fabric_code),
            output_dir: output_root.to_path_buf(),
        }
    }

    pub fn file_name(&self, layer: Layer) -> String {
        format!("{}_distributed_{}.geojson", self.fabric_code, layer.name())
    }

    pub fn input(&self, layer: Layer) -> PathBuf {
        self.input_dir.join(self.file_name(layer))
    }

    pub fn output(&self, layer: Layer) -> PathBuf {
        self.output_dir.join(self.file_name(layer))
    }
}
