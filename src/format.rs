/// Human readable size: `X.X KB` below 1024 KB, `X.XX MB` below 1024 MB,
/// `X.XX GB` above. Unknown or negative sizes render as `—`.
pub fn human_size(bytes: Option<i64>) -> String {
    let Some(bytes) = bytes.filter(|b| *b >= 0) else {
        return "—".to_string();
    };

    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{kb:.1} KB");
    }
    let mb = kb / 1024.0;
    if mb < 1024.0 {
        return format!("{mb:.2} MB");
    }
    format!("{:.2} GB", mb / 1024.0)
}

/// [`human_size`] for unsigned sizes.
pub fn human_bytes(bytes: Option<u64>) -> String {
    human_size(bytes.map(|b| i64::try_from(b).unwrap_or(i64::MAX)))
}

/// KB value with one decimal, or MB once it reaches 1024 KB.
pub fn human_kb(kb: f64) -> String {
    if kb < 1024.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{:.1} MB", kb / 1024.0)
    }
}
