use std::path::PathBuf;

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/feeddeck/ (XDG standard)
    // instead of macOS Application Support for consistency
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("feeddeck")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feeddeck")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("feeddeck")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feeddeck")
    }
}

pub fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

pub fn cache_dir() -> PathBuf {
    // ~/.cache/feeddeck/ on unix; the raw feed payloads live directly in here
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(temp_dir)
            .join(".cache")
            .join("feeddeck")
    }
    #[cfg(windows)]
    {
        dirs::cache_dir()
            .unwrap_or_else(temp_dir)
            .join("feeddeck")
    }
}

/// Downloads land here, and the local-file source lists it.
pub fn files_dir() -> PathBuf {
    cache_dir().join("files")
}

/// Player argv used when the config does not name one.
///
/// Small ARM boards get the hardware-accelerated omxplayer; everything else
/// gets mpv.
pub fn default_player() -> Vec<String> {
    if cfg!(target_arch = "arm") {
        vec!["omxplayer".to_string()]
    } else {
        vec!["mpv".to_string(), "--really-quiet".to_string()]
    }
}

#[cfg(unix)]
pub fn downloader_binary_name() -> &'static str {
    "yt-dlp"
}

#[cfg(windows)]
pub fn downloader_binary_name() -> &'static str {
    "yt-dlp.exe"
}
