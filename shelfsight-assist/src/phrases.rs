//! Fixed spoken phrases

/// Spoken right before a capture
pub const STOP_CUE: &str = "Stop";

/// Idle move prompt, repeated while no object is seen
pub const MOVE_PROMPT: &str = "Keep moving the object";

/// Follows an uninformative description
pub const ROTATE_CUE: &str = "Please rotate the object";

/// Announced once the detection model is ready
pub const MODEL_LOADED: &str = "Object detection model loaded";

/// Default tutorial narration, one utterance per paragraph
pub const TUTORIAL: &[&str] = &[
    "Welcome to Shelfsight. Hold an item in front of the camera and it will tell you what it is.",
    "A tone plays while an object is in view. The tone gets higher as the object moves toward the center of the picture.",
    "When the object is centered, you will hear Stop. Hold still while the picture is taken.",
    "The description is then read aloud. If the item could not be identified, rotate it and try again.",
    "If no object is seen for a while, you will be asked to keep moving the object. After a few reminders the camera pauses until you resume.",
    "Open settings to choose what is reported, such as the brand, the expiration range, mold or a recipe.",
];
