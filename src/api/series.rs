use core::fmt;

/// API path segment selecting the kind of data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// gamyba
    Generation,
    /// vartojimas
    Consumption,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Category::Generation => "gamyba",
            Category::Consumption => "vartojimas",
        };
        write!(f, "{}", c)
    }
}

/// The datasets the analysis is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesId {
    /// Kaupimo įrenginių gamyba
    Storage,
    /// Saulės elektrinių gamyba
    Solar,
    /// Kitų elektrinių gamyba
    Other,
    /// Šiluminių elektrinių gamyba
    Thermal,
    /// Hidroelektrinių gamyba
    Hydro,
    /// Vėjo elektrinių gamyba
    Wind,
    /// Elektros vartojimas
    Consumption,
}

impl SeriesId {
    pub const ALL: [SeriesId; 7] = [
        SeriesId::Storage,
        SeriesId::Solar,
        SeriesId::Other,
        SeriesId::Thermal,
        SeriesId::Hydro,
        SeriesId::Wind,
        SeriesId::Consumption,
    ];

    pub const GENERATION: [SeriesId; 6] = [
        SeriesId::Storage,
        SeriesId::Solar,
        SeriesId::Other,
        SeriesId::Thermal,
        SeriesId::Hydro,
        SeriesId::Wind,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in [`SeriesId::ALL`], used as the column index of the tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn dataset_id(self) -> &'static str {
        match self {
            SeriesId::Storage => "101",
            SeriesId::Solar => "102",
            SeriesId::Other => "103",
            SeriesId::Thermal => "104",
            SeriesId::Hydro => "105",
            SeriesId::Wind => "106",
            SeriesId::Consumption => "203",
        }
    }

    pub fn category(self) -> Category {
        match self {
            SeriesId::Consumption => Category::Consumption,
            _ => Category::Generation,
        }
    }

    pub fn is_generation(self) -> bool {
        self.category() == Category::Generation
    }

    /// Header used in the exported table
    pub fn column_name(self) -> &'static str {
        match self {
            SeriesId::Storage => "Kaupimo",
            SeriesId::Solar => "Saules",
            SeriesId::Other => "Kitu",
            SeriesId::Thermal => "Siluminiu",
            SeriesId::Hydro => "Hidro",
            SeriesId::Wind => "Vejo",
            SeriesId::Consumption => "Vartojimas",
        }
    }

    /// Path below the API base, `{category}/{dataset_id}`
    pub fn path(self) -> String {
        format!("{}/{}", self.category(), self.dataset_id())
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeriesId::Storage => "Storage",
            SeriesId::Solar => "Solar",
            SeriesId::Other => "Other",
            SeriesId::Thermal => "Thermal",
            SeriesId::Hydro => "Hydro",
            SeriesId::Wind => "Wind",
            SeriesId::Consumption => "Consumption",
        };
        write!(f, "{}", name)
    }
}
