use ledger::{Amount, Direction, Preview, Record};
use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::html,
};

pub(crate) const CANCELLED: &str = "Pencatatan dibatalkan. Gunakan /start untuk memulai lagi.";
pub(crate) const SESSION_EXPIRED: &str =
    "Sesi Anda sudah berakhir. Ketik /start untuk mencatat transaksi baru.";
pub(crate) const UNKNOWN_CHOICE: &str =
    "Terjadi kesalahan. Silakan mulai ulang dengan /start.";
pub(crate) const STALE_BUTTON: &str = "Menu ini sudah tidak berlaku.";
pub(crate) const SUBMITTED: &str =
    "✅ Data berhasil dicatat! Ketik /start untuk mencatat transaksi lain.";
pub(crate) const SUBMIT_FAILED: &str =
    "❌ Gagal mengirim data. Silakan ulangi dengan /start.";
pub(crate) const AMOUNT_INVALID: &str =
    "Nominal tidak valid. Harap masukkan <b>hanya angka positif</b> (tanpa titik/koma/Rp).";
pub(crate) const REVIEW_UNAVAILABLE: &str =
    "Ringkasan tidak dapat ditampilkan. Kirim keterangan yang lebih singkat.";

/// Everything a button can send back as callback data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Direction(Direction),
    Category(String),
    BackToDirection,
    BackToCategory,
    BackToAmount,
    Submit,
    EditDirection,
    EditCategory,
    EditAmount,
    EditNote,
    Unknown(String),
}

impl Action {
    pub(crate) fn parse(data: &str) -> Action {
        if let Some(direction) = Direction::from_token(data) {
            return Action::Direction(direction);
        }
        match data {
            "kembali_transaksi" => Action::BackToDirection,
            "kembali_kategori" => Action::BackToCategory,
            "kembali_nominal" => Action::BackToAmount,
            "aksi_kirim" => Action::Submit,
            "ubah_transaksi" => Action::EditDirection,
            "ubah_kategori" => Action::EditCategory,
            "ubah_nominal" => Action::EditAmount,
            "ubah_keterangan" => Action::EditNote,
            token if token.starts_with("masuk_") || token.starts_with("keluar_") => {
                Action::Category(token.to_string())
            }
            other => Action::Unknown(other.to_string()),
        }
    }

    fn token(&self) -> &str {
        match self {
            Action::Direction(direction) => direction.token(),
            Action::Category(token) | Action::Unknown(token) => token,
            Action::BackToDirection => "kembali_transaksi",
            Action::BackToCategory => "kembali_kategori",
            Action::BackToAmount => "kembali_nominal",
            Action::Submit => "aksi_kirim",
            Action::EditDirection => "ubah_transaksi",
            Action::EditCategory => "ubah_kategori",
            Action::EditAmount => "ubah_nominal",
            Action::EditNote => "ubah_keterangan",
        }
    }
}

fn button(label: impl Into<String>, action: &Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.token().to_string())
}

fn back_button(action: &Action) -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ Kembali ke Menu Sebelumnya", action)]
}

pub(crate) fn render_directions(first_name: &str) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "Halo {}! Silakan pilih transaksi yang ingin Anda catat:",
        html::escape(first_name)
    );
    let kb = InlineKeyboardMarkup::new(vec![
        vec![button("✅ Masuk", &Action::Direction(Direction::Inflow))],
        vec![button("❌ Keluar", &Action::Direction(Direction::Outflow))],
        vec![button(
            "💳 Tabungan",
            &Action::Direction(Direction::SavingsOutflow),
        )],
    ]);
    (text, kb)
}

pub(crate) fn render_categories(direction: Direction) -> (String, InlineKeyboardMarkup) {
    let text = match direction {
        Direction::Inflow => "Silakan pilih kategori <b>Pemasukan</b>:".to_string(),
        Direction::Outflow => "Silakan pilih kategori <b>Pengeluaran</b>:".to_string(),
        Direction::SavingsOutflow => "Anda memilih <b>Tabungan</b>. Pengeluaran akan dilakukan dari tabungan. Silakan pilih kategori:".to_string(),
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = direction
        .catalog()
        .entries()
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| button(c.name, &Action::Category(c.token.to_string())))
                .collect()
        })
        .collect();
    rows.push(vec![button(
        "⬅️ Kembali ke Menu Transaksi",
        &Action::BackToDirection,
    )]);

    (text, InlineKeyboardMarkup::new(rows))
}

pub(crate) fn render_amount_prompt(
    direction: Direction,
    category: &str,
) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "Anda memilih <b>Transaksi {}</b> dengan <b>Kategori {}</b>.\n\nSekarang, <b>tuliskan jumlah nominal transaksi</b> (hanya angka, tanpa titik/koma/Rp):",
        direction.label(),
        html::escape(category)
    );
    (
        text,
        InlineKeyboardMarkup::new(vec![back_button(&Action::BackToCategory)]),
    )
}

pub(crate) fn render_note_prompt(amount: Amount) -> (String, InlineKeyboardMarkup) {
    let text = format!(
        "Nominal: <b>Rp {amount}</b> berhasil dicatat.\n\nSekarang, tambahkan <b>Keterangan</b> dari transaksi tersebut (misalnya, 'Bubur Ayam', 'Bayar Listrik'):"
    );
    (
        text,
        InlineKeyboardMarkup::new(vec![back_button(&Action::BackToAmount)]),
    )
}

pub(crate) fn render_review(record: &Record) -> (String, InlineKeyboardMarkup) {
    let kb = InlineKeyboardMarkup::new(vec![
        vec![button("✅ Kirim", &Action::Submit)],
        vec![
            button("Ubah Transaksi", &Action::EditDirection),
            button("Ubah Kategori", &Action::EditCategory),
        ],
        vec![
            button("Ubah Nominal", &Action::EditAmount),
            button("Ubah Keterangan", &Action::EditNote),
        ],
    ]);
    (preview_html(&record.preview()), kb)
}

fn preview_html(preview: &Preview) -> String {
    let mut text = format!("<b>{}</b>\n\n", html::escape(preview.title));
    for (label, value) in &preview.fields {
        text.push_str(&format!("<b>{label}:</b> {}\n", html::escape(value)));
    }
    text.push('\n');
    text.push_str(&html::code_inline(&preview.summary));
    text
}
