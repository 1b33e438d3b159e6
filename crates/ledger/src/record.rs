use std::fmt;

use crate::{Amount, Direction};

/// Longest note shown in a [`Preview`]; longer notes are cut and end in `…`.
/// Keeps a preview well inside a single chat message.
pub const PREVIEW_NOTE_CHARS: usize = 500;

/// A fully captured entry, ready to be reviewed and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub direction: Direction,
    pub category: String,
    pub amount: Amount,
    pub note: String,
}

/// Human-readable summary of a [`Record`].
///
/// `fields` is the labelled block shown to the user; `summary` is the
/// single-line form `<direction> <amount> <category> <note>` that can be
/// copied and parsed back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub title: &'static str,
    pub fields: Vec<(&'static str, String)>,
    pub summary: String,
}

impl Record {
    pub fn preview(&self) -> Preview {
        let note = clip(&self.note);
        Preview {
            title: "Inputan Anda:",
            fields: vec![
                ("Transaksi", self.direction.label().to_string()),
                ("Kategori", self.category.clone()),
                ("Nominal", format!("Rp {}", self.amount)),
                ("Keterangan", note.clone()),
            ],
            summary: format!(
                "{} {} {} {}",
                self.direction.label(),
                self.amount.units(),
                self.category,
                note
            ),
        }
    }
}

fn clip(note: &str) -> String {
    match note.char_indices().nth(PREVIEW_NOTE_CHARS) {
        Some((idx, _)) => format!("{}…", &note[..idx]),
        None => note.to_string(),
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        for (label, value) in &self.fields {
            writeln!(f, "{label}: {value}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch() -> Record {
        Record {
            direction: Direction::Outflow,
            category: "Makan".to_string(),
            amount: Amount::new(15_000),
            note: "Lunch".to_string(),
        }
    }

    #[test]
    fn preview_lists_every_field() {
        let preview = lunch().preview();
        assert_eq!(
            preview.fields,
            vec![
                ("Transaksi", "Keluar".to_string()),
                ("Kategori", "Makan".to_string()),
                ("Nominal", "Rp 15.000".to_string()),
                ("Keterangan", "Lunch".to_string()),
            ]
        );
        assert_eq!(preview.summary, "Keluar 15000 Makan Lunch");
    }

    #[test]
    fn long_note_is_clipped_in_the_preview() {
        let record = Record {
            note: "é".repeat(PREVIEW_NOTE_CHARS + 1),
            ..lunch()
        };
        let preview = record.preview();
        let shown = &preview.fields[3].1;
        assert_eq!(shown.chars().count(), PREVIEW_NOTE_CHARS + 1);
        assert!(shown.ends_with('…'));
        assert!(preview.summary.ends_with(shown.as_str()));
        assert_eq!(record.note.chars().count(), PREVIEW_NOTE_CHARS + 1);

        let exact = Record {
            note: "a".repeat(PREVIEW_NOTE_CHARS),
            ..lunch()
        };
        assert_eq!(exact.preview().fields[3].1, exact.note);
    }

    #[test]
    fn preview_text_is_deterministic() {
        let text = lunch().preview().to_string();
        assert_eq!(
            text,
            "Inputan Anda:\n\nTransaksi: Keluar\nKategori: Makan\nNominal: Rp 15.000\nKeterangan: Lunch\n\nKeluar 15000 Makan Lunch"
        );
        assert_eq!(text, lunch().preview().to_string());
    }
}
