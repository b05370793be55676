/// Formats a byte count with binary units, e.g. `1.50 MiB`.
pub fn format_bytes(bytes: u64, precision: usize) -> String {
    const UNIT: f64 = 1024.0;
    const SIZES: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if bytes == 0 {
        return format!("{:.*} B", precision, 0.0);
    }

    let idx = ((bytes as f64).log(UNIT).floor() as usize).min(SIZES.len() - 1);
    let value = bytes as f64 / UNIT.powi(idx as i32);

    format!("{:.*} {}", precision, value, SIZES[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0, 0), "0 B");
        assert_eq!(format_bytes(512, 0), "512 B");
        assert_eq!(format_bytes(1024, 2), "1.00 KiB");
        assert_eq!(format_bytes(1536 * 1024, 2), "1.50 MiB");
        assert_eq!(format_bytes(1024_u64.pow(3), 1), "1.0 GiB");
    }
}
