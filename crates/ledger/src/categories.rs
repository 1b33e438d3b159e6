//! Static category catalogs and the top-level transaction direction.

use serde::{Deserialize, Serialize};

/// Label used when a category token does not belong to the active catalog.
pub const NOT_FOUND: &str = "N/A";

/// A category as shown on a button (`name`) and as sent back by it (`token`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub token: &'static str,
}

const fn category(name: &'static str, token: &'static str) -> Category {
    Category { name, token }
}

/// Ordered, read-only mapping from display name to token.
#[derive(Debug, PartialEq, Eq)]
pub struct Catalog {
    entries: &'static [Category],
}

pub static INFLOW: Catalog = Catalog {
    entries: &[
        category("Gaji", "masuk_gaji"),
        category("Bonus", "masuk_bonus"),
        category("Hadiah", "masuk_hadiah"),
        category("Lainnya", "masuk_lainnya"),
    ],
};

pub static OUTFLOW: Catalog = Catalog {
    entries: &[
        category("Angsuran", "keluar_angsuran"),
        category("Asuransi", "keluar_asuransi"),
        category("Belanja", "keluar_belanja"),
        category("Hewan", "keluar_hewan"),
        category("Hiburan", "keluar_hiburan"),
        category("Investasi", "keluar_investasi"),
        category("Kendaraan", "keluar_kendaraan"),
        category("Kesehatan", "keluar_kesehatan"),
        category("Langganan", "keluar_langganan"),
        category("Makan", "keluar_makan"),
        category("Pajak", "keluar_pajak"),
        category("Pakaian", "keluar_pakaian"),
        category("Pendidikan", "keluar_pendidikan"),
        category("Perawatan", "keluar_perawatan"),
        category("RumahTangga", "keluar_rumahtangga"),
        category("Tabungan", "keluar_tabungan"),
        category("Lainnya", "keluar_lainnya"),
    ],
};

impl Catalog {
    pub fn entries(&self) -> &'static [Category] {
        self.entries
    }

    /// First category (in catalog order) whose token equals `token`.
    pub fn find(&self, token: &str) -> Option<&'static Category> {
        self.entries.iter().find(|c| c.token == token)
    }

    /// Display name for `token`, or [`NOT_FOUND`] when the catalog has no
    /// such token.
    pub fn resolve(&self, token: &str) -> &'static str {
        self.find(token).map_or(NOT_FOUND, |c| c.name)
    }
}

/// Top-level classification chosen on the first menu.
///
/// `SavingsOutflow` is spending paid from savings: it shares the outflow
/// catalog but is reported downstream under its own label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inflow,
    Outflow,
    SavingsOutflow,
}

impl Direction {
    pub const ALL: [Direction; 3] = [
        Direction::Inflow,
        Direction::Outflow,
        Direction::SavingsOutflow,
    ];

    pub fn catalog(self) -> &'static Catalog {
        match self {
            Direction::Inflow => &INFLOW,
            Direction::Outflow | Direction::SavingsOutflow => &OUTFLOW,
        }
    }

    /// Label stored in the sink (`transaksi` field).
    pub fn label(self) -> &'static str {
        match self {
            Direction::Inflow => "Masuk",
            Direction::Outflow => "Keluar",
            Direction::SavingsOutflow => "Tabungan",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::Inflow => "transaksi_masuk",
            Direction::Outflow => "transaksi_keluar",
            Direction::SavingsOutflow => "transaksi_tabungan",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }
}
