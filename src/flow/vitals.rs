use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::FlowError;
use crate::models::VitalsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalsStage {
    Landing,
    Camera,
    Processing,
    Results,
}

impl fmt::Display for VitalsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalsStage::Landing => write!(f, "landing"),
            VitalsStage::Camera => write!(f, "camera"),
            VitalsStage::Processing => write!(f, "processing"),
            VitalsStage::Results => write!(f, "results"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VitalsEvent {
    StartCapture,
    CaptureComplete,
    ProcessingComplete(VitalsResult),
    Back,
}

impl fmt::Display for VitalsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VitalsEvent::StartCapture => "start a capture",
            VitalsEvent::CaptureComplete => "finish capture",
            VitalsEvent::ProcessingComplete(_) => "show results",
            VitalsEvent::Back => "go back",
        };
        write!(f, "{}", name)
    }
}

/// Next vitals stage for `event`, or `None` if the event is not allowed here
pub fn next_vitals_stage(stage: VitalsStage, event: &VitalsEvent) -> Option<VitalsStage> {
    use VitalsStage::*;

    match (stage, event) {
        (Landing | Results, VitalsEvent::StartCapture) => Some(Camera),
        (Camera, VitalsEvent::CaptureComplete) => Some(Processing),
        (Processing, VitalsEvent::ProcessingComplete(_)) => Some(Results),
        (Camera, VitalsEvent::Back) => Some(Landing),
        (Processing, VitalsEvent::Back) => Some(Camera),
        (Results, VitalsEvent::Back) => Some(Landing),
        _ => None,
    }
}

/// Owner of the vitals sequence and the last delivered reading
#[derive(Debug, Clone)]
pub struct VitalsFlow {
    stage: VitalsStage,
    last_result: Option<VitalsResult>,
}

impl VitalsFlow {
    pub fn new() -> Self {
        Self {
            stage: VitalsStage::Landing,
            last_result: None,
        }
    }

    pub fn stage(&self) -> VitalsStage {
        self.stage
    }

    pub fn last_result(&self) -> Option<&VitalsResult> {
        self.last_result.as_ref()
    }

    pub fn apply(&mut self, event: VitalsEvent) -> Result<VitalsStage, FlowError> {
        let next =
            next_vitals_stage(self.stage, &event).ok_or_else(|| FlowError::invalid(self.stage, &event))?;

        debug!(from = %self.stage, to = %next, %event, "vitals transition");
        if let VitalsEvent::ProcessingComplete(result) = event {
            self.last_result = Some(result);
        }
        self.stage = next;
        Ok(next)
    }
}

impl Default for VitalsFlow {
    fn default() -> Self {
        Self::new()
    }
}
