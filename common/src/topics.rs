pub const STATUS_SUFFIX: &str = "status";
pub const AVAILABILITY_SUFFIX: &str = "availability";
pub const ANNOUNCE_SUFFIX: &str = "announce";

pub const AVAILABILITY_ONLINE: &str = "online";
pub const AVAILABILITY_OFFLINE: &str = "offline";

fn join(base: &str, suffix: &str) -> String {
    format!("{}/{suffix}", base.trim_end_matches('/'))
}

pub fn status_topic(base: &str) -> String {
    join(base, STATUS_SUFFIX)
}

pub fn availability_topic(base: &str) -> String {
    join(base, AVAILABILITY_SUFFIX)
}

pub fn announce_topic(base: &str) -> String {
    join(base, ANNOUNCE_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_hang_off_the_configured_base() {
        assert_eq!(status_topic("rtsp-mic"), "rtsp-mic/status");
        assert_eq!(availability_topic("birds/mic1/"), "birds/mic1/availability");
        assert_eq!(announce_topic("rtsp-mic"), "rtsp-mic/announce");
    }
}
