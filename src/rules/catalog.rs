//! Rule tables: brand → required columns, category → brands, valid
//! categories, and named part-number formats.
//!
//! The built-in tables cover the vendors we import. A JSON rule book can
//! override any subset: map entries are replaced per key, lists wholesale.
//!
//! ```json
//! {
//!   "required_columns": { "acme": ["store", "category"] },
//!   "formats": { "acme-sku": { "kind": "prefixed", "prefixes": ["AC"] } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::rules::format::{FormatSpec, FormatValidator};

static FILENAME_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9.]+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
    /// Brand (lowercase) → columns every export for that brand must carry.
    pub required_columns: BTreeMap<String, Vec<String>>,
    /// Category → stores/brands expected to carry it.
    pub categories: BTreeMap<String, Vec<String>>,
    /// Allowed values of the per-row `category` column.
    pub valid_categories: Vec<String>,
    /// Named part-number formats.
    pub formats: BTreeMap<String, FormatSpec>,
}

/// On-disk overlay; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleBookOverlay {
    #[serde(default)]
    required_columns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
    valid_categories: Option<Vec<String>>,
    #[serde(default)]
    formats: BTreeMap<String, FormatSpec>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleBook {
    pub fn builtin() -> Self {
        Self {
            required_columns: to_map(BRAND_COLUMNS),
            categories: to_map(CATEGORY_BRANDS),
            valid_categories: VALID_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            formats: builtin_formats(),
        }
    }

    /// Built-in tables, overlaid with the JSON file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut book = Self::builtin();
        let Some(path) = path else {
            return Ok(book);
        };

        let file = File::open(path)
            .map_err(|e| AppError::input(format!("Failed to open rule book '{}': {e}", path.display())))?;
        let overlay: RuleBookOverlay = serde_json::from_reader(file)
            .map_err(|e| AppError::input(format!("Invalid rule book '{}': {e}", path.display())))?;
        book.apply(overlay);
        Ok(book)
    }

    fn apply(&mut self, overlay: RuleBookOverlay) {
        for (brand, cols) in overlay.required_columns {
            let cols = cols.iter().map(|c| c.trim().to_lowercase()).collect();
            self.required_columns.insert(brand.trim().to_lowercase(), cols);
        }
        for (category, brands) in overlay.categories {
            let brands = brands.iter().map(|b| b.trim().to_lowercase()).collect();
            self.categories.insert(category.trim().to_lowercase(), brands);
        }
        if let Some(valid) = overlay.valid_categories {
            self.valid_categories = valid;
        }
        self.formats.extend(overlay.formats);
    }

    /// Categories whose brand list contains `store` (case-insensitive).
    pub fn expected_categories(&self, store: &str) -> BTreeSet<String> {
        let store = store.trim().to_lowercase();
        self.categories
            .iter()
            .filter(|(_, brands)| brands.iter().any(|b| *b == store))
            .map(|(category, _)| category.clone())
            .collect()
    }

    pub fn required_columns_for(&self, brand: &str) -> Option<BTreeSet<String>> {
        self.required_columns
            .get(&brand.trim().to_lowercase())
            .map(|cols| cols.iter().cloned().collect())
    }

    /// First file-name token that names a known brand.
    ///
    /// `27012025_hpe_db_import.csv` → `hpe`. Dots stay inside tokens so
    /// `memory.net` can match.
    pub fn infer_brand(&self, path: &Path) -> Option<String> {
        let base = path.file_name()?.to_str()?.to_lowercase();
        FILENAME_SPLIT
            .split(&base)
            .find(|t| self.required_columns.contains_key(*t))
            .map(str::to_string)
    }

    pub fn validator(&self, name: &str) -> Result<FormatValidator, AppError> {
        let spec = self.formats.get(name).ok_or_else(|| {
            let known = self.formats.keys().cloned().collect::<Vec<_>>().join(", ");
            AppError::input(format!("Unknown format `{name}` (known: {known})"))
        })?;
        FormatValidator::compile(name, spec)
    }

    pub fn valid_category_set(&self) -> BTreeSet<String> {
        self.valid_categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect()
    }
}

fn to_map(table: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

fn builtin_formats() -> BTreeMap<String, FormatSpec> {
    let mut formats = BTreeMap::new();
    formats.insert(
        "cisco-option".to_string(),
        FormatSpec::Prefixed {
            prefixes: vec!["UCS".to_string(), "UCSX".to_string()],
        },
    );
    formats.insert(
        "hpe-mfr".to_string(),
        FormatSpec::Suffixed {
            min_len: 4,
            max_len: 6,
            suffixes: HPE_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        },
    );
    formats
}

const HPE_SUFFIXES: [&str; 9] = ["-B21", "-H21", "-K21", "-S01", "-L22", "-S21", "-L21", "-001", "-B22"];

const VALID_CATEGORIES: [&str; 7] = ["adapter", "hba", "hdd", "memory", "optical_drives", "processor", "ssd"];

const CATEGORY_BRANDS: &[(&str, &[&str])] = &[
    (
        "memory",
        &[
            "asus", "axiom", "cisco", "crucial", "dell", "fujitsu", "giga byte", "hpe", "kingston", "lenovo",
            "oracle", "supermicro", "serversupply", "memory.net",
        ],
    ),
    (
        "ssd",
        &[
            "axiom", "cisco", "crucial", "dell", "dell- pdf", "distech", "fujitsu", "hpe", "intel", "kingston",
            "lenovo", "mrmemory", "samsung", "vmware",
        ],
    ),
    (
        "hdd",
        &[
            "axiom", "cisco", "dell", "dell- pdf", "distech", "fujitsu", "hpe", "lenovo", "supermicro",
            "serversupply", "vmware",
        ],
    ),
    ("adapter", &["dell", "distech", "hpe", "oracle"]),
    ("hba", &["dell", "distech", "hpe", "oracle"]),
    ("optical_drives", &["hpe"]),
    ("processor", &["amd", "dell", "hpe", "intel"]),
    ("gpu", &["amd", "intel"]),
    ("server", &["asacomputer"]),
];

const BRAND_COLUMNS: &[(&str, &[&str])] = &[
    (
        "asus",
        &[
            "host_image_url", "host_url", "server_description", "server_specification", "store", "dimm_slots",
            "maximum_memory", "part_description", "processor", "a", "b", "c", "encode_status", "memory_sku",
            "capacity", "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height",
            "qty", "category", "part_url",
        ],
    ),
    (
        "axiom",
        &[
            "store", "a", "b", "c", "server_description", "category", "option_part_no", "part_description", "oem",
            "mfr_part_no", "part_specification", "memory", "ssd", "hdd", "processor", "dimm_slots",
            "maximum_memory", "maximum_rdimm", "maximum_lrdimm", "maximum_sodimm", "maximum_udimm",
            "encode_status", "capacity", "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc",
            "voltage", "height", "qty", "interface", "form_factor", "sequential_read", "sequential_write",
            "random_read", "random_write", "dwpd", "part_image_url", "host_url", "part_url", "capacity_in_tb",
            "capacity_in_gb", "dimensions", "product_id",
        ],
    ),
    (
        "cisco",
        &[
            "store", "option_part_no", "server_description", "a", "b", "c", "part_description", "dimm_slots",
            "maximum_memory", "maximum_rdimm", "maximum_lrdimm", "maximum_udimm", "maximum_sodimm", "category",
            "processor", "memory", "ssd", "hdd", "capacity", "speed", "ranks", "rank_width", "memory_type",
            "dimm_type", "ecc", "voltage", "height", "qty", "interface", "form_factor", "encode_status",
            "file_name", "host_url", "part_url", "capacity_in_tb", "capacity_in_gb", "product_id", "dimm_ranks",
            "server_dimm_ranks", "mfr_part_no", "spare_part_no", "oem", "model",
        ],
    ),
    (
        "crucial",
        &[
            "store", "a", "b", "c", "server_description", "category", "part_number", "part_description",
            "part_specification", "server_specification", "configuration_notes", "memory", "ssd", "processor",
            "dimm_slots", "maximum_memory", "storage_support", "memory_specification", "encode_status", "speed",
            "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "qty", "part_image_url",
            "host_url", "part_url", "capacity", "capacity_in_gb", "capacity_in_tb", "dimensions", "form_factor",
            "height", "interface", "memory_sku",
        ],
    ),
    (
        "dell",
        &[
            "store", "a", "b", "c", "server_description", "category", "mfr_part_no", "part_description",
            "part_specification", "server_specification", "oem", "memory", "ssd", "processor", "hba", "adapter",
            "compatibility", "dimm_slots", "maximum_memory", "product_id", "memory_specification",
            "maximum_lrdimm", "maximum_rdimm", "maximum_udimm", "maximum_sodimm", "encode_status",
            "configuration_notes", "capacity", "capacity_in_tb", "capacity_in_gb", "speed", "ranks",
            "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty", "interface",
            "form_factor", "dimensions", "server_dimm_ranks", "dimm_ranks", "part_image_url", "host_url",
            "part_url", "gen_series", "gen",
        ],
    ),
    (
        "fujitsu",
        &[
            "store", "a", "b", "c", "server_description", "category", "part_description", "server_specification",
            "product_id", "processor", "dimm_slots", "maximum_udimm", "maximum_sodimm", "maximum_lrdimm",
            "maximum_rdimm", "maximum_memory", "capacity", "speed", "ranks", "rank_width", "memory_type",
            "dimm_type", "ecc", "voltage", "height", "qty", "interface", "form_factor", "capacity_in_tb",
            "capacity_in_gb", "encoded_status", "file_name", "file_urls", "host_image_url", "host_url",
            "part_url",
        ],
    ),
    (
        "giga byte",
        &[
            "server_description", "server_specification", "host_image_url", "host_url", "store",
            "part_description", "dimm_slots", "processor", "a", "b", "c", "encode_status", "product_id",
            "category", "capacity", "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage",
            "height", "qty", "part_url",
        ],
    ),
    (
        "hpe",
        &[
            "store", "a", "b", "c", "option_part_no", "server_description", "part_description", "category",
            "product_id", "dimm_slots", "maximum_memory", "maximum_rdimm", "maximum_lrdimm", "maximum_udimm",
            "maximum_sodimm", "processor", "memory", "ssd", "hdd", "adapter", "hba", "optical_drives", "capacity",
            "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty",
            "processor_sockets", "capacity_in_tb", "capacity_in_gb", "form_factor", "interface", "dimensions",
            "server_specification", "storage", "server_form_factor", "chassis", "dimm_ranks",
            "server_dimm_ranks", "file_name", "host_url", "part_url", "gen",
        ],
    ),
    (
        "kingston",
        &[
            "store", "a", "b", "c", "server_description", "server_form_factor", "category", "option_part_no",
            "part_description", "part_specification", "server_specification", "configuration_notes", "memory",
            "ssd", "dimm_slots", "processor_sockets", "maximum_memory", "storage_support", "ssd_sku",
            "memory_specification", "encode_status", "capacity", "capacity_in_tb", "capacity_in_gb", "speed",
            "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty", "interface",
            "form_factor", "dimensions", "part_image_url", "host_url", "part_url", "product_id", "dimm_ranks",
            "server_dimm_ranks", "chipset", "processor", "processor_max_memory_speed",
        ],
    ),
    (
        "lenovo",
        &[
            "server_description", "server_specification", "a", "b", "c", "processor", "gpu", "memory", "ssd",
            "hdd", "dimm_slots", "memory_channels", "maximum_memory", "maximum_udimm", "maximum_sodimm",
            "maximum_lrdimm", "maximum_rdimm", "storage_support", "mfr_part_no", "category", "part_description",
            "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty",
            "encode_status", "part_image_url", "host_image_url", "file_url", "api_url", "part_url", "host_url",
            "store", "capacity", "capacity_in_gb", "capacity_in_tb", "dimensions", "form_factor", "interface",
            "product_id", "gen",
        ],
    ),
    (
        "oracle",
        &[
            "store", "part_number", "memory_sku", "server_description", "a", "b", "c", "part_description",
            "dimm_slots", "maximum_memory", "maximum_rdimm", "maximum_lrdimm", "maximum_udimm", "maximum_sodimm",
            "category", "processor", "memory", "ssd", "hdd", "hba", "adapter", "optical_drives", "capacity",
            "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty",
            "encode_status", "file_name", "host_url", "part_url",
        ],
    ),
    (
        "supermicro",
        &[
            "store", "a", "b", "c", "server_description", "category", "option_part_no", "part_description", "oem",
            "mfr_part_no", "part_specification", "server_specification", "processor", "memory", "ssd", "hdd",
            "dimm_slots", "maximum_memory", "storage_support", "memory_specification", "encode_status", "speed",
            "ranks", "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height.1", "qty", "host_url",
            "part_url", "dimensions", "height", "product_id", "model", "sequential_read", "sequential_write",
            "random_read", "random_write", "dwpd", "form_factor", "interface", "capacity", "capacity_in_gb",
            "capacity_in_tb",
        ],
    ),
    (
        "serversupply",
        &[
            "store", "part_description", "category", "mfr_part_no", "manufacturer", "part_specification",
            "memory", "ssd", "hhd", "processor", "dimm_slots", "maximum_memory", "storage_support", "product_id",
            "encode_status", "capacity", "speed", "ranks", "rank_width", "memory_type", "dimm_type", "ecc",
            "voltage", "height", "qty", "part_url",
        ],
    ),
    (
        "memory.net",
        &["a", "b", "c", "dimm_slots", "maximum_memory", "processor", "server_description", "store"],
    ),
    (
        "samsung",
        &[
            "store", "category", "mfr_part_no", "model", "interface", "form_factor", "capacity",
            "sequential_read", "sequential_write", "random_read", "random_write", "product_status", "dwpd",
            "part_url", "capacity_in_tb", "capacity_in_gb", "product_id",
        ],
    ),
    (
        "vmware",
        &[
            "category", "part_number", "oem", "dwpd", "form_factor", "capacity", "oem_part_number",
            "part_description", "interface", "part_specification", "part_url", "store", "capacity_in_tb",
            "capacity_in_gb", "memory_sku",
        ],
    ),
    (
        "asacomputer",
        &[
            "store", "category", "server_specification", "host_url", "server_description",
            "management_software", "m2_drives", "pcie", "note", "operating_system", "sata_dom",
            "ready_to_ship_system", "u2_nvme_drives", "dimm_slots", "drive_bays", "system_management", "m2_nvme",
            "optical_drive", "lan", "power_supply", "memory", "add_on_pcie", "cpu", "hard_drive", "network",
            "sata_ssd_drives", "warranty",
        ],
    ),
    (
        "amd",
        &[
            "store", "category", "product_family", "memory_type", "maximum_memory_channels",
            "maximum_memory_speed", "launch_date", "platform", "mfr_part_no", "processor_series",
            "product_specification", "product_name", "part_url",
        ],
    ),
    (
        "intel",
        &[
            "product_name", "category", "product_family", "product_line", "platform", "model_number",
            "maximum_memory_channels", "maximum_memory_size", "maximum_memory_bandwidth", "memory_type",
            "maximum_memory_speed", "ecc_memory_supported", "physical_address_extensions",
            "product_specification", "compliance_description", "specification_code", "ordering_code",
            "part_url", "store", "chipset", "specifications", "compatible_products", "chipset_url",
            "marketing status", "launch date", "servicing status", "end of servicing updates date", "dpc",
        ],
    ),
    (
        "asrock",
        &[
            "server_description", "host_url", "server_specification", "dimm_slots", "maximum_memory",
            "part_description", "a", "b", "c", "encode_status", "product_id", "capacity", "speed", "ranks",
            "rank_width", "memory_type", "dimm_type", "ecc", "voltage", "height", "qty", "store", "category",
            "part_url",
        ],
    ),
    (
        "distech",
        &[
            "store", "part_number", "part_description", "category", "oem", "oem_part_number",
            "part_specification", "memory_sku", "capacity", "interface", "form_factor", "sequential_read",
            "sequential_write", "random_read", "random_write", "dwpd", "height", "dimensions", "capacity_in_gb",
            "capacity_in_tb", "part_url",
        ],
    ),
];
