//! Multi-step guided intake wizard.
//!
//! One session per user, keyed by user alone; the conversation context
//! that triggered a step is irrelevant. Stages only move forward; any step
//! arriving without a live session resolves to a benign `Expired` outcome.
//! The terminal step emits exactly one handoff record.

use chrono::Utc;
use dashmap::DashMap;
use tracing::{info, warn};
use uuid::Uuid;

use gatehouse_types::error::GatewayError;
use gatehouse_types::identity::UserId;
use gatehouse_types::wizard::{
    HandoffRecord, RequestKind, Subject, WizardOutcome, WizardStage, WizardStep, MAX_DETAILS_LEN,
};

use crate::collaborators::HandoffSink;

#[derive(Debug, Clone)]
struct WizardSession {
    stage: WizardStage,
    details: String,
    subject: Option<Subject>,
}

/// Drives the intake form and emits handoffs through the sink.
pub struct SessionWizard<H: HandoffSink> {
    sessions: DashMap<UserId, WizardSession>,
    sink: H,
}

impl<H: HandoffSink> SessionWizard<H> {
    pub fn new(sink: H) -> Self {
        Self {
            sessions: DashMap::new(),
            sink,
        }
    }

    /// Apply one wizard step for a user.
    pub async fn step(
        &self,
        user: UserId,
        step: WizardStep,
    ) -> Result<WizardOutcome, GatewayError> {
        match step {
            WizardStep::Start { details } => self.start(user, details),
            WizardStep::ChooseSubject { subject } => self.choose_subject(user, subject),
            WizardStep::ChooseKind { kind } => self.choose_kind(user, kind).await,
        }
    }

    /// Intake-form submission. Overwrites any stale session for the user.
    fn start(&self, user: UserId, details: String) -> Result<WizardOutcome, GatewayError> {
        let details = details.trim().to_string();
        if details.is_empty() {
            return Err(GatewayError::InvalidInput("details are required".into()));
        }
        if details.len() > MAX_DETAILS_LEN {
            return Err(GatewayError::InvalidInput(format!(
                "details exceed {MAX_DETAILS_LEN} characters"
            )));
        }

        self.sessions.insert(
            user,
            WizardSession {
                stage: WizardStage::DetailsCollected,
                details,
                subject: None,
            },
        );
        Ok(WizardOutcome::AwaitingSubject)
    }

    fn choose_subject(&self, user: UserId, subject: Subject) -> Result<WizardOutcome, GatewayError> {
        let Some(mut session) = self.sessions.get_mut(&user) else {
            return Ok(WizardOutcome::Expired);
        };
        // Re-picking a subject before the final step just updates the
        // choice; it never moves the session backwards.
        session.subject = Some(subject);
        session.stage = WizardStage::SubjectChosen;
        Ok(WizardOutcome::AwaitingKind)
    }

    /// Terminal step: emit the handoff, then delete the session.
    async fn choose_kind(
        &self,
        user: UserId,
        kind: RequestKind,
    ) -> Result<WizardOutcome, GatewayError> {
        // Remove before the suspension point so a concurrent resend of the
        // final step sees no session and cannot trigger a second handoff.
        let Some((_, session)) = self.sessions.remove(&user) else {
            return Ok(WizardOutcome::Expired);
        };
        let (WizardStage::SubjectChosen, Some(subject)) = (session.stage, session.subject) else {
            // Kind picked before a subject: the session is out of order,
            // treat it as lost rather than fabricating a partial handoff.
            warn!(%user, "wizard kind step without chosen subject");
            return Ok(WizardOutcome::Expired);
        };

        let record = HandoffRecord {
            id: Uuid::now_v7(),
            user,
            subject,
            kind,
            details: session.details.clone(),
            created_at: Utc::now(),
        };

        if let Err(err) = self.sink.deliver(&record).await {
            // Put the session back so the user can retry the final step,
            // unless they already started a fresh intake while delivery
            // was in flight; the fresh session wins over the stale one.
            warn!(%user, error = %err, "handoff delivery failed");
            self.sessions.entry(user).or_insert(session);
            return Err(err);
        }

        info!(%user, record_id = %record.id, "intake handoff emitted");
        Ok(WizardOutcome::Completed { record })
    }

    /// Whether a user currently has a live session (admin/diagnostic).
    pub fn has_session(&self, user: UserId) -> bool {
        self.sessions.contains_key(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test sink collecting delivered records, optionally failing.
    struct RecordingSink {
        records: Mutex<Vec<HandoffRecord>>,
        fail: Mutex<bool>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: Mutex::new(false),
            }
        }

        fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn delivered(&self) -> Vec<HandoffRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl HandoffSink for &RecordingSink {
        async fn deliver(&self, record: &HandoffRecord) -> Result<(), GatewayError> {
            if *self.fail.lock().unwrap() {
                return Err(GatewayError::CollaboratorUnavailable(
                    "admin channel missing".into(),
                ));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn full_flow_emits_exactly_one_handoff() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);
        let user = UserId(1);

        let outcome = wizard
            .step(
                user,
                WizardStep::Start {
                    details: "need help factoring quadratics".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, WizardOutcome::AwaitingSubject);

        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Maths,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, WizardOutcome::AwaitingKind);

        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::Homework,
                },
            )
            .await
            .unwrap();
        let WizardOutcome::Completed { record } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(record.subject, Subject::Maths);
        assert_eq!(record.kind, RequestKind::Homework);
        assert_eq!(record.details, "need help factoring quadratics");

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].id, record.id);
    }

    #[tokio::test]
    async fn resending_final_step_yields_expired_not_second_handoff() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);
        let user = UserId(2);

        wizard
            .step(user, WizardStep::Start { details: "x".into() })
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Science,
                },
            )
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::XpBoost,
                },
            )
            .await
            .unwrap();

        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::XpBoost,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, WizardOutcome::Expired);
        assert_eq!(sink.delivered().len(), 1);
    }

    #[tokio::test]
    async fn steps_without_session_are_benign() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);

        let outcome = wizard
            .step(
                UserId(3),
                WizardStep::ChooseSubject {
                    subject: Subject::Reading,
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, WizardOutcome::Expired);
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test]
    async fn restart_overwrites_stale_session() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);
        let user = UserId(4);

        wizard
            .step(user, WizardStep::Start { details: "old".into() })
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Maths,
                },
            )
            .await
            .unwrap();

        // Restart from scratch; subject choice is gone.
        wizard
            .step(user, WizardStep::Start { details: "new".into() })
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Reading,
                },
            )
            .await
            .unwrap();
        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::Homework,
                },
            )
            .await
            .unwrap();

        let WizardOutcome::Completed { record } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(record.details, "new");
        assert_eq!(record.subject, Subject::Reading);
    }

    #[tokio::test]
    async fn empty_or_oversized_details_rejected() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);

        let err = wizard
            .step(UserId(5), WizardStep::Start { details: "  ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));

        let err = wizard
            .step(
                UserId(5),
                WizardStep::Start {
                    details: "x".repeat(MAX_DETAILS_LEN + 1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert!(!wizard.has_session(UserId(5)));
    }

    /// Sink that parks the first delivery on a gate, then fails it.
    struct SuspendingSink {
        records: Mutex<Vec<HandoffRecord>>,
        gate: tokio::sync::Notify,
        suspend_and_fail: Mutex<bool>,
    }

    impl SuspendingSink {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                gate: tokio::sync::Notify::new(),
                suspend_and_fail: Mutex::new(true),
            }
        }
    }

    impl HandoffSink for &SuspendingSink {
        async fn deliver(&self, record: &HandoffRecord) -> Result<(), GatewayError> {
            if *self.suspend_and_fail.lock().unwrap() {
                self.gate.notified().await;
                *self.suspend_and_fail.lock().unwrap() = false;
                return Err(GatewayError::CollaboratorUnavailable(
                    "admin channel missing".into(),
                ));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_handoff_does_not_clobber_a_new_intake() {
        let sink = SuspendingSink::new();
        let wizard = SessionWizard::new(&sink);
        let user = UserId(8);

        wizard
            .step(user, WizardStep::Start { details: "old".into() })
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Maths,
                },
            )
            .await
            .unwrap();

        // The final step suspends inside delivery; the user starts a fresh
        // intake during that suspension, then delivery fails.
        let final_step = wizard.step(
            user,
            WizardStep::ChooseKind {
                kind: RequestKind::Homework,
            },
        );
        let interleaved = async {
            wizard
                .step(user, WizardStep::Start { details: "new".into() })
                .await
                .unwrap();
            sink.gate.notify_one();
        };
        let (result, ()) = tokio::join!(final_step, interleaved);
        assert!(matches!(
            result,
            Err(GatewayError::CollaboratorUnavailable(_))
        ));

        // The fresh session survives; completing it hands off "new".
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Reading,
                },
            )
            .await
            .unwrap();
        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::Homework,
                },
            )
            .await
            .unwrap();
        let WizardOutcome::Completed { record } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(record.details, "new");
        assert_eq!(record.subject, Subject::Reading);
        assert_eq!(sink.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sink_failure_keeps_session_for_retry() {
        let sink = RecordingSink::new();
        let wizard = SessionWizard::new(&sink);
        let user = UserId(6);

        wizard
            .step(user, WizardStep::Start { details: "d".into() })
            .await
            .unwrap();
        wizard
            .step(
                user,
                WizardStep::ChooseSubject {
                    subject: Subject::Maths,
                },
            )
            .await
            .unwrap();

        sink.set_fail(true);
        let err = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::Homework,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::CollaboratorUnavailable(_)));
        assert!(wizard.has_session(user));

        sink.set_fail(false);
        let outcome = wizard
            .step(
                user,
                WizardStep::ChooseKind {
                    kind: RequestKind::Homework,
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, WizardOutcome::Completed { .. }));
        assert_eq!(sink.delivered().len(), 1);
    }
}
