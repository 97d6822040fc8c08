/// Distinguishes a cold power-on from a warm reset-button press.
///
/// Power-on clears CPU RAM and reinitializes every device; a soft reset
/// preserves RAM contents and the CPU registers the way the hardware does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetKind {
    PowerOn,
    Soft,
}
