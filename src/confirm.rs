//! Destructive actions require an explicit user confirmation.
//!
//! The only way to obtain a `Confirmed<A>` is `PendingConfirmation::confirm`,
//! so an operation taking `Confirmed<A>` cannot run without the shell
//! having shown `prompt()` and the user having accepted.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub title: &'static str,
    pub message: &'static str,
    pub confirm_label: &'static str,
    pub cancel_label: &'static str,
}

impl Prompt {
    const fn new(title: &'static str, message: &'static str, confirm_label: &'static str) -> Self {
        Self {
            title,
            message,
            confirm_label,
            cancel_label: "취소",
        }
    }
}

pub trait Destructive {
    fn prompt(&self) -> Prompt;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePhoto {
    pub photo_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelProposal {
    pub slot_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unblock {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelGathering {
    pub gathering_id: String,
}

impl Destructive for Logout {
    fn prompt(&self) -> Prompt {
        Prompt::new("로그아웃", "정말 로그아웃 하시겠어요?", "로그아웃")
    }
}

impl Destructive for DeletePhoto {
    fn prompt(&self) -> Prompt {
        Prompt::new("사진 삭제", "정말 삭제하시겠어요?", "삭제")
    }
}

impl Destructive for CancelProposal {
    fn prompt(&self) -> Prompt {
        Prompt::new("제안 취소", "식사 제안을 취소하시겠어요?", "제안 취소")
    }
}

impl Destructive for Unblock {
    fn prompt(&self) -> Prompt {
        Prompt::new("차단 해제", "정말 해제하시겠어요?", "해제")
    }
}

impl Destructive for CancelGathering {
    fn prompt(&self) -> Prompt {
        Prompt::new("모임 취소", "모임을 취소하시겠어요?", "모임 취소")
    }
}

#[derive(Debug)]
pub struct PendingConfirmation<A> {
    action: A,
}

impl<A: Destructive> PendingConfirmation<A> {
    pub fn new(action: A) -> Self {
        Self { action }
    }

    pub fn prompt(&self) -> Prompt {
        self.action.prompt()
    }

    pub fn confirm(self) -> Confirmed<A> {
        Confirmed { action: self.action }
    }

    /// The user backed out; the action is dropped.
    pub fn dismiss(self) {}
}

#[derive(Debug)]
pub struct Confirmed<A> {
    action: A,
}

impl<A> Confirmed<A> {
    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn into_inner(self) -> A {
        self.action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        let pending = PendingConfirmation::new(DeletePhoto { photo_id: "p1".into() });
        assert_eq!(pending.prompt().title, "사진 삭제");
        assert_eq!(pending.prompt().message, "정말 삭제하시겠어요?");
        let confirmed = pending.confirm();
        assert_eq!(confirmed.action().photo_id, "p1");

        assert_eq!(PendingConfirmation::new(Logout).prompt().message, "정말 로그아웃 하시겠어요?");
        assert_eq!(PendingConfirmation::new(Unblock { user_id: "u".into() }).prompt().title, "차단 해제");
        assert_eq!(
            PendingConfirmation::new(CancelProposal { slot_id: "s".into() }).prompt().message,
            "식사 제안을 취소하시겠어요?"
        );
    }
}
