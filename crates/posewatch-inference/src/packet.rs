//! Upstream landmark packet boundary.
//!
//! The vision pipeline delivers one packet per processed frame: 33
//! landmarks as packed floats in row-major `(x, y, score)` order.
//! Decoding failures are reported, logged, and the frame is dropped;
//! they are never fatal.

use serde::{Deserialize, Serialize};

use posewatch_core::{Error, Landmark, LandmarkSet, PoseIndex, Result, Timestamp};

/// Floats per landmark: x, y, score
const VALUES_PER_LANDMARK: usize = 3;

/// Expected payload length (33 landmarks x 3 floats)
pub const PACKET_LEN: usize = PoseIndex::COUNT * VALUES_PER_LANDMARK;

/// Raw per-frame landmark payload from the vision pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkPacket {
    /// Nanosecond timestamp when the frame was captured
    pub timestamp: i64,

    /// Sequence number for frame ordering
    pub sequence_number: u32,

    /// Packed landmark values, row-major (x, y, score)
    pub values: Vec<f32>,
}

impl LandmarkPacket {
    pub fn new(timestamp: i64, sequence_number: u32, values: Vec<f32>) -> Self {
        Self {
            timestamp,
            sequence_number,
            values,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_nanos(self.timestamp)
    }

    /// Validate payload integrity
    pub fn is_valid(&self) -> bool {
        self.values.len() == PACKET_LEN && self.values.iter().all(|v| v.is_finite())
    }

    /// Decode the payload into a typed landmark set
    pub fn decode(&self) -> Result<LandmarkSet> {
        if self.values.len() != PACKET_LEN {
            return Err(Error::MalformedPacket(format!(
                "payload length {} != {}",
                self.values.len(),
                PACKET_LEN
            )));
        }

        if let Some(pos) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(Error::MalformedPacket(format!(
                "non-finite value at offset {pos}"
            )));
        }

        let landmarks: Vec<Landmark> = self
            .values
            .chunks_exact(VALUES_PER_LANDMARK)
            .map(|chunk| Landmark::new(chunk[0], chunk[1], chunk[2]))
            .collect();

        LandmarkSet::from_slice(&landmarks)
    }

    /// One-line debug summary of the payload
    pub fn debug_summary(&self) -> String {
        format!(
            "pose landmarks: {} (seq {})",
            self.values.len() / VALUES_PER_LANDMARK,
            self.sequence_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> Vec<f32> {
        (0..PACKET_LEN).map(|i| (i % 10) as f32 / 10.0).collect()
    }

    #[test]
    fn test_decode_valid_packet() {
        let packet = LandmarkPacket::new(1_000, 7, valid_payload());
        let set = packet.decode().unwrap();

        assert_eq!(set[0].x, 0.0);
        assert_eq!(set[0].y, 0.1);
        assert_eq!(set[0].score, 0.2);
        assert_eq!(set[1].x, 0.3);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let packet = LandmarkPacket::new(0, 0, vec![0.5; 42]);
        assert!(matches!(
            packet.decode(),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_finite() {
        let mut values = valid_payload();
        values[50] = f32::NAN;
        let packet = LandmarkPacket::new(0, 0, values);

        assert!(!packet.is_valid());
        assert!(matches!(
            packet.decode(),
            Err(Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_debug_summary() {
        let packet = LandmarkPacket::new(0, 3, valid_payload());
        assert_eq!(packet.debug_summary(), "pose landmarks: 33 (seq 3)");
    }
}
