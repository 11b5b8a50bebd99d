pub mod elevenlabs;
pub mod stoic;
