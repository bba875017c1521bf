use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// ID for a conversation thread (UUID v4 hex, 32 chars)
pub fn thread_id() -> String {
    new_id()
}

pub fn member_id() -> String {
    new_id()
}

pub fn message_id() -> String {
    new_id()
}

pub fn slot_id() -> String {
    new_id()
}

pub fn photo_id() -> String {
    new_id()
}

pub fn block_id() -> String {
    new_id()
}

pub fn gathering_id() -> String {
    new_id()
}

pub fn participant_id() -> String {
    new_id()
}

/// Short form used in log lines: first 6 chars + ellipsis.
pub fn short(id: &str) -> String {
    if id.chars().count() > 6 {
        let head: String = id.chars().take(6).collect();
        format!("{}…", head)
    } else {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = thread_id();
        let b = thread_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_short() {
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("ChIJ1234567"), "ChIJ12…");
    }
}
