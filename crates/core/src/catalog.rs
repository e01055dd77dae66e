use crate::model::{StepCategory, StepId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub category: StepCategory,
    pub interactive: bool,
}

const fn automatic(id: StepId, category: StepCategory) -> Step {
    Step {
        id,
        category,
        interactive: false,
    }
}

const fn interactive(id: StepId, category: StepCategory) -> Step {
    Step {
        id,
        category,
        interactive: true,
    }
}

/// Execution order of a detection run. Automatic probes come first so the
/// operator is only asked to interact once the unattended checks are done.
pub const STEP_CATALOG: [Step; 12] = [
    automatic(StepId::Hardware, StepCategory::System),
    automatic(StepId::Battery, StepCategory::Power),
    automatic(StepId::Storage, StepCategory::Storage),
    automatic(StepId::Refurbishment, StepCategory::Provenance),
    automatic(StepId::Network, StepCategory::Connectivity),
    automatic(StepId::Sensors, StepCategory::System),
    interactive(StepId::Screen, StepCategory::Display),
    interactive(StepId::Keyboard, StepCategory::Input),
    interactive(StepId::Trackpad, StepCategory::Input),
    interactive(StepId::Camera, StepCategory::Multimedia),
    interactive(StepId::Microphone, StepCategory::Multimedia),
    interactive(StepId::Speaker, StepCategory::Multimedia),
];

pub fn steps() -> &'static [Step] {
    &STEP_CATALOG
}

pub fn find_step(id: StepId) -> Option<&'static Step> {
    STEP_CATALOG.iter().find(|step| step.id == id)
}

pub fn position(id: StepId) -> Option<usize> {
    STEP_CATALOG.iter().position(|step| step.id == id)
}
