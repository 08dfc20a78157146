//! Tag namespace: sections, the static tag table, and vendor tags.

use std::collections::HashMap;

use devmeta_common::{DataType, TagId};
use serde::{Deserialize, Serialize};

/// First section value reserved for vendor extension tags.
pub const VENDOR_SECTION_START: u16 = 0x8000;

/// Sections of the static tag namespace.
///
/// A tag's section is the high 16 bits of its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Section {
    Properties = 0,
    Sensor = 1,
    Statistics = 2,
    Control = 3,
    Exposure = 4,
    Focus = 5,
    Flash = 6,
    Zoom = 7,
    Stream = 8,
    Jpeg = 9,
    Video = 10,
}

impl Section {
    /// Number of static sections.
    pub const COUNT: u16 = 11;

    /// Resolves a raw section value, if it names a static section.
    pub fn from_raw(section: u16) -> Option<Self> {
        match section {
            0 => Some(Section::Properties),
            1 => Some(Section::Sensor),
            2 => Some(Section::Statistics),
            3 => Some(Section::Control),
            4 => Some(Section::Exposure),
            5 => Some(Section::Focus),
            6 => Some(Section::Flash),
            7 => Some(Section::Zoom),
            8 => Some(Section::Stream),
            9 => Some(Section::Jpeg),
            10 => Some(Section::Video),
            _ => None,
        }
    }

    /// Returns the lowercase section name.
    pub fn name(&self) -> &'static str {
        match self {
            Section::Properties => "properties",
            Section::Sensor => "sensor",
            Section::Statistics => "statistics",
            Section::Control => "control",
            Section::Exposure => "exposure",
            Section::Focus => "focus",
            Section::Flash => "flash",
            Section::Zoom => "zoom",
            Section::Stream => "stream",
            Section::Jpeg => "jpeg",
            Section::Video => "video",
        }
    }
}

/// Static declaration of one tag.
#[derive(Debug, Clone, Copy)]
struct StaticTag {
    id: u32,
    name: &'static str,
    data_type: DataType,
    /// Declared element count; `None` means variable length.
    count: Option<u32>,
}

macro_rules! tag {
    ($id:expr, $name:expr, $ty:ident, $count:expr) => {
        StaticTag {
            id: $id,
            name: $name,
            data_type: DataType::$ty,
            count: $count,
        }
    };
}

/// Built-in device capability and per-request tags.
static STATIC_TAGS: &[StaticTag] = &[
    // Properties
    tag!(0x0000_0000, "properties.vendor_name", Byte, None),
    tag!(0x0000_0001, "properties.model_name", Byte, None),
    tag!(0x0000_0002, "properties.connection_type", Byte, Some(1)),
    tag!(0x0000_0003, "properties.firmware_version", Byte, None),
    // Sensor
    tag!(0x0001_0000, "sensor.orientation", Int32, Some(1)),
    tag!(0x0001_0001, "sensor.sensitivity", Int32, None),
    tag!(0x0001_0002, "sensor.active_array", Int32, None),
    tag!(0x0001_0003, "sensor.pixel_size", Float, Some(2)),
    tag!(0x0001_0004, "sensor.exposure_time_range", Int64, Some(2)),
    tag!(0x0001_0005, "sensor.max_frame_duration", Int64, Some(1)),
    tag!(0x0001_0006, "sensor.physical_aperture", Double, Some(1)),
    // Statistics
    tag!(0x0002_0000, "statistics.face_detect_mode", Byte, Some(1)),
    tag!(0x0002_0001, "statistics.max_face_count", Int32, Some(1)),
    tag!(0x0002_0002, "statistics.histogram_counts", UInt32, None),
    // Control
    tag!(0x0003_0000, "control.mode", Byte, Some(1)),
    tag!(0x0003_0001, "control.available_modes", Byte, None),
    tag!(0x0003_0002, "control.capture_intent", Byte, Some(1)),
    // Exposure
    tag!(0x0004_0000, "exposure.mode", Byte, Some(1)),
    tag!(0x0004_0001, "exposure.compensation_range", Int32, Some(2)),
    tag!(0x0004_0002, "exposure.compensation_step", Rational, Some(1)),
    // Focus
    tag!(0x0005_0000, "focus.mode", Byte, Some(1)),
    tag!(0x0005_0001, "focus.distance_range", Float, Some(2)),
    // Flash
    tag!(0x0006_0000, "flash.available", Byte, Some(1)),
    tag!(0x0006_0001, "flash.mode", Byte, Some(1)),
    // Zoom
    tag!(0x0007_0000, "zoom.ratio_range", Float, Some(2)),
    tag!(0x0007_0001, "zoom.max_ratio", Float, Some(1)),
    // Stream
    tag!(0x0008_0000, "stream.available_formats", Int32, None),
    tag!(0x0008_0001, "stream.available_sizes", Int32, None),
    tag!(0x0008_0002, "stream.fps_ranges", Int32, None),
    // Jpeg
    tag!(0x0009_0000, "jpeg.quality", Byte, Some(1)),
    tag!(0x0009_0001, "jpeg.thumbnail_sizes", Int32, None),
    tag!(0x0009_0002, "jpeg.max_size", Int32, Some(1)),
    // Video
    tag!(0x000a_0000, "video.stabilization_mode", Byte, Some(1)),
    tag!(0x000a_0001, "video.frame_rate_range", Int32, Some(2)),
];

/// A vendor-supplied tag declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorTag {
    /// Tag identifier (section at or above `VENDOR_SECTION_START`).
    pub id: TagId,
    /// Human-readable tag name.
    pub name: String,
    /// Declared element data type.
    pub data_type: DataType,
}

/// Resolves tag identifiers to names and declared types.
///
/// The registry combines the built-in static table with a vendor tag table
/// supplied once at construction. It is immutable afterwards; lookups
/// consult the static table first, then the vendor table.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    static_tags: HashMap<u32, &'static StaticTag>,
    vendor_tags: HashMap<u32, VendorTag>,
}

impl TagRegistry {
    /// Creates a registry with only the built-in static table.
    pub fn new() -> Self {
        Self::with_vendor_tags([])
    }

    /// Creates a registry with the built-in table plus vendor tags.
    pub fn with_vendor_tags(vendor: impl IntoIterator<Item = VendorTag>) -> Self {
        let static_tags = STATIC_TAGS.iter().map(|tag| (tag.id, tag)).collect();
        let vendor_tags = vendor.into_iter().map(|tag| (tag.id.0, tag)).collect();
        Self {
            static_tags,
            vendor_tags,
        }
    }

    /// Returns true if the identifier lies in the vendor extension range.
    pub fn is_vendor(item: TagId) -> bool {
        item.section() >= VENDOR_SECTION_START
    }

    /// Resolves the static section of an identifier, if any.
    pub fn section_of(item: TagId) -> Option<Section> {
        Section::from_raw(item.section())
    }

    /// Resolves an identifier to its human-readable name.
    ///
    /// Returns `None` for identifiers absent from both tables; callers
    /// degrade to the numeric identifier rather than failing.
    pub fn name_of(&self, item: TagId) -> Option<&str> {
        if let Some(tag) = self.static_tags.get(&item.0) {
            return Some(tag.name);
        }
        self.vendor_tags.get(&item.0).map(|tag| tag.name.as_str())
    }

    /// Resolves an identifier to its declared element type.
    pub fn declared_type_of(&self, item: TagId) -> Option<DataType> {
        if let Some(tag) = self.static_tags.get(&item.0) {
            return Some(tag.data_type);
        }
        self.vendor_tags.get(&item.0).map(|tag| tag.data_type)
    }

    /// Returns the declared element count of a static tag.
    ///
    /// `None` for variable-length tags and for identifiers outside the
    /// static table (vendor tags do not declare a count).
    pub fn declared_count_of(&self, item: TagId) -> Option<u32> {
        self.static_tags.get(&item.0).and_then(|tag| tag.count)
    }

    /// Number of registered vendor tags.
    pub fn vendor_tag_count(&self) -> usize {
        self.vendor_tags.len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}
