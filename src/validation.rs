//! Inline input validation. Everything here runs before a remote call and
//! returns `AppError::Validation` carrying the user-facing message.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::constants::{
    BIO_MAX_CHARS, DISPLAY_NAME_MAX_CHARS, DISPLAY_NAME_MIN_CHARS, MESSAGE_MAX_CHARS,
};
use crate::{AppError, AppResult};

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn invalid(msg: &str) -> AppError {
    AppError::Validation(msg.to_string())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(invalid("이메일을 입력해주세요."));
    }
    if !email_regex().is_match(trimmed) {
        return Err(invalid("올바른 이메일 주소를 입력해주세요."));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(invalid("닉네임을 입력해주세요."));
    }
    let len = name.chars().count();
    if len < DISPLAY_NAME_MIN_CHARS {
        return Err(invalid("닉네임은 최소 2자 이상이어야 합니다."));
    }
    if len > DISPLAY_NAME_MAX_CHARS {
        return Err(invalid("닉네임은 50자 미만이어야 합니다."));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> AppResult<()> {
    if bio.chars().count() > BIO_MAX_CHARS {
        return Err(invalid("소개는 200자 이하여야 합니다."));
    }
    Ok(())
}

pub fn validate_message(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(invalid("메시지를 입력해주세요."));
    }
    if text.chars().count() > MESSAGE_MAX_CHARS {
        return Err(invalid("메시지가 너무 깁니다."));
    }
    Ok(())
}

/// A meeting must be scheduled strictly after `now`.
pub fn validate_meeting_time(starts_at: &DateTime<Utc>, now: &DateTime<Utc>) -> AppResult<()> {
    if starts_at <= now {
        return Err(invalid("식사 시간은 미래로 설정해야 합니다."));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(invalid("제목을 입력해주세요."));
    }
    if title.chars().count() > DISPLAY_NAME_MAX_CHARS {
        return Err(invalid("제목이 너무 깁니다."));
    }
    Ok(())
}
