use serde::{Deserialize, Serialize};

pub mod sink {
    use super::*;

    /// Flat record posted to the ingestion hook.
    ///
    /// Field names are the ones the downstream spreadsheet scenario expects,
    /// so they are kept as-is on the wire.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SinkPayload {
        pub user_id: u64,
        pub first_name: String,
        pub username: String,
        /// Direction label (`Masuk`, `Keluar`, `Tabungan`).
        pub transaksi: String,
        pub kategori_nama: String,
        /// Whole units, no separators.
        pub nominal: u64,
        pub keterangan: String,
    }
}
