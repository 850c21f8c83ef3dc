use chrono::Utc;

pub fn info(msg: impl std::fmt::Display) {
    let date_time = get_date_time();
    println!("[{date_time} \x1b[32mINFO\x1b[0m ] {msg}")
}

pub fn error(msg: impl std::fmt::Display) {
    let date_time = get_date_time();
    eprintln!("[{date_time} \x1b[31mERROR\x1b[0m ] {msg}")
}

fn get_date_time() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use crate::common::logging::get_date_time;

    #[test]
    fn test_get_date_time_format() {
        let date_time = get_date_time();
        assert_eq!(date_time.len(), "2026-01-01T00:00:00Z".len());
        assert!(date_time.ends_with('Z'));
        assert_eq!(&date_time[4..5], "-");
        assert_eq!(&date_time[10..11], "T");
    }
}
