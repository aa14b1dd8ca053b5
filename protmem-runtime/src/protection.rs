//! Protection Unit for the Xprotmem extension
//!
//! Owns the per-hart protection state: the lock mode, the protected segment
//! descriptor, the entry pointer and the pending return address. Every
//! instruction fetch, load and store issued by the hart is checked here
//! before memory is touched.
//!
//! ## State machine
//!
//! ```text
//!             setproti / setprotd
//!               ┌──────────┐
//!               ▼          │
//!          ┌──────────┐────┘      enterprot       ┌──────────────────┐
//!  start → │ Unlocked │ ───────────────────────▶ │ Locked(Pending)  │
//!          └──────────┘                          └──────────────────┘
//!               ▲                                         │ fetch at entry
//!               │            exitprot            ┌──────────────────┐
//!               └─────────────────────────────── │ Locked(Active)   │
//!                                                └──────────────────┘
//! ```
//!
//! The mode, the pending return address and the trusted-routine flag are a
//! single tagged value, so a transition is one assignment.

use crate::error::{Fault, MissingConfig, Operation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Kind of memory access being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Fetch,
    Read,
    Write,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessKind::Fetch => "fetch",
            AccessKind::Read => "read",
            AccessKind::Write => "write",
        })
    }
}

/// Observable protection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    Unlocked,
    Locked,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModeKind::Unlocked => "unlocked",
            ModeKind::Locked => "locked",
        })
    }
}

/// Protected Memory Segment descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub base: u32,
    pub length: u32,
}

impl Segment {
    pub const fn new(base: u32, length: u32) -> Self {
        Self { base, length }
    }

    /// One past the last protected byte. May exceed the 32-bit address space.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.base as u64 + self.length as u64
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.base && (address as u64) < self.end()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#010x}, {:#010x})", self.base, self.end())
    }
}

/// Proof that the trusted routine is running.
///
/// Minted only by [`ProtectionUnit::admit_fetch`] at the entry pointer and
/// dropped with the lock on `exitprot`. Not `Clone`, so it cannot outlive
/// the routine that owns it.
#[derive(Debug, PartialEq, Eq)]
pub struct SegmentCapability {
    _sealed: (),
}

impl SegmentCapability {
    fn mint() -> Self {
        Self { _sealed: () }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Routine {
    /// `enterprot` executed, entry instruction not yet fetched
    Pending,
    /// Entry instruction fetched; the routine holds the capability
    Active(SegmentCapability),
}

#[derive(Debug, PartialEq, Eq)]
struct Lock {
    return_address: u32,
    routine: Routine,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Unlocked,
    Locked(Lock),
}

/// Protection registers of one hart
///
/// Only [`ProtectionUnit`] can construct or mutate this.
#[derive(Debug, PartialEq, Eq)]
pub struct ProtectionState {
    mode: Mode,
    entry_pointer: Option<u32>,
    segment: Option<Segment>,
}

impl ProtectionState {
    fn new() -> Self {
        Self {
            mode: Mode::Unlocked,
            entry_pointer: None,
            segment: None,
        }
    }

    pub fn mode(&self) -> ModeKind {
        match self.mode {
            Mode::Unlocked => ModeKind::Unlocked,
            Mode::Locked(_) => ModeKind::Locked,
        }
    }

    pub fn segment(&self) -> Option<Segment> {
        self.segment
    }

    /// Entry pointer; reading it is only permitted while unlocked
    pub fn entry_pointer(&self) -> Result<Option<u32>, Fault> {
        match self.mode {
            Mode::Unlocked => Ok(self.entry_pointer),
            Mode::Locked(_) => Err(Fault::PrivilegeViolation {
                operation: Operation::ReadEntryPointer,
                mode: ModeKind::Locked,
            }),
        }
    }

    /// Pending return target recorded by `enterprot`
    pub fn return_address(&self) -> Option<u32> {
        match &self.mode {
            Mode::Locked(lock) => Some(lock.return_address),
            Mode::Unlocked => None,
        }
    }

    /// Capability held by the running trusted routine, if any
    pub fn capability(&self) -> Option<&SegmentCapability> {
        match &self.mode {
            Mode::Locked(Lock {
                routine: Routine::Active(cap),
                ..
            }) => Some(cap),
            _ => None,
        }
    }

    #[inline]
    pub fn trusted_routine_active(&self) -> bool {
        self.capability().is_some()
    }

    /// True between `enterprot` and the fetch of the entry instruction
    pub fn entry_pending(&self) -> bool {
        matches!(
            self.mode,
            Mode::Locked(Lock {
                routine: Routine::Pending,
                ..
            })
        )
    }
}

/// Access decision table
///
/// | mode     | in segment | trusted | result           |
/// |----------|------------|---------|------------------|
/// | Unlocked | any        | any     | permitted        |
/// | Locked   | no         | any     | permitted        |
/// | Locked   | yes        | yes     | permitted        |
/// | Locked   | yes        | no      | ProtmemViolation |
pub fn decide(
    mode: ModeKind,
    segment: Option<Segment>,
    address: u32,
    kind: AccessKind,
    trusted: bool,
) -> Result<(), Fault> {
    let inside = segment.map_or(false, |s| s.contains(address));
    match (mode, inside, trusted) {
        (ModeKind::Locked, true, false) => Err(Fault::ProtmemViolation { address, kind }),
        _ => Ok(()),
    }
}

/// Protection Unit: executes the Xprotmem instructions and checks accesses
#[derive(Debug)]
pub struct ProtectionUnit {
    state: ProtectionState,
}

impl ProtectionUnit {
    pub fn new() -> Self {
        Self {
            state: ProtectionState::new(),
        }
    }

    pub fn state(&self) -> &ProtectionState {
        &self.state
    }

    #[inline]
    pub fn mode(&self) -> ModeKind {
        self.state.mode()
    }

    /// `setproti`: set the entry pointer
    pub fn setproti(&mut self, target: u32) -> Result<(), Fault> {
        self.require_unlocked(Operation::Setproti)?;
        debug!(target = format_args!("{target:#010x}"), "setproti");
        self.state.entry_pointer = Some(target);
        Ok(())
    }

    /// `setprotd`: set the protected segment.
    ///
    /// The range is not checked against mapped memory here; an unmapped
    /// address surfaces on the first access through the memory path.
    pub fn setprotd(&mut self, base: u32, length: u32) -> Result<(), Fault> {
        self.require_unlocked(Operation::Setprotd)?;
        let segment = Segment::new(base, length);
        debug!(%segment, "setprotd");
        self.state.segment = Some(segment);
        Ok(())
    }

    /// `enterprot`: lock and transfer control to the entry pointer.
    ///
    /// Returns the next PC.
    pub fn enterprot(&mut self, return_target: u32) -> Result<u32, Fault> {
        self.require_unlocked(Operation::Enterprot)?;

        let missing = match (self.state.entry_pointer, self.state.segment) {
            (Some(entry), Some(segment)) if !segment.is_empty() => {
                self.state.mode = Mode::Locked(Lock {
                    return_address: return_target,
                    routine: Routine::Pending,
                });
                debug!(
                    entry = format_args!("{entry:#010x}"),
                    return_target = format_args!("{return_target:#010x}"),
                    "enterprot: locked"
                );
                return Ok(entry);
            }
            (Some(_), Some(_)) => MissingConfig::EmptySegment,
            (None, Some(_)) => MissingConfig::EntryPointer,
            (Some(_), None) => MissingConfig::Segment,
            (None, None) => MissingConfig::Both,
        };

        let fault = Fault::ConfigurationFault { missing };
        warn!(%fault, "enterprot rejected");
        Err(fault)
    }

    /// `exitprot`: unlock and transfer control to `target`.
    ///
    /// `target` is not compared with the recorded return address.
    pub fn exitprot(&mut self, target: u32) -> Result<u32, Fault> {
        if let Mode::Unlocked = self.state.mode {
            return Err(self.privilege_fault(Operation::Exitprot));
        }
        self.state.mode = Mode::Unlocked;
        debug!(target = format_args!("{target:#010x}"), "exitprot: unlocked");
        Ok(target)
    }

    /// Admit an instruction fetch at `pc`.
    ///
    /// Between `enterprot` and the first fetch, the only admissible PC is the
    /// entry pointer; fetching it activates the trusted routine.
    pub fn admit_fetch(&mut self, pc: u32) -> Result<(), Fault> {
        let entry = self.state.entry_pointer;
        if let Mode::Locked(lock) = &mut self.state.mode {
            if lock.routine == Routine::Pending {
                if entry != Some(pc) {
                    let fault = Fault::ProtmemViolation {
                        address: pc,
                        kind: AccessKind::Fetch,
                    };
                    warn!(%fault, "control did not reach the entry pointer");
                    return Err(fault);
                }
                lock.routine = Routine::Active(SegmentCapability::mint());
                debug!(pc = format_args!("{pc:#010x}"), "trusted routine active");
            }
        }
        Ok(())
    }

    /// Check one byte access against the current state. Pure.
    pub fn check_access(&self, address: u32, kind: AccessKind) -> Result<(), Fault> {
        decide(
            self.state.mode(),
            self.state.segment,
            address,
            kind,
            self.state.trusted_routine_active(),
        )
    }

    /// Check every byte of `[address, address + len)`.
    ///
    /// Equivalent to `check_access` on each byte in ascending order; only the
    /// lowest byte inside the segment can be the first to fault.
    pub fn check_range(&self, address: u32, len: u32, kind: AccessKind) -> Result<(), Fault> {
        let Some(segment) = self.state.segment else {
            return Ok(());
        };
        let end = address as u64 + len as u64;
        let first = (address as u64).max(segment.base as u64);
        if first < end.min(segment.end()) {
            return self.check_access(first as u32, kind);
        }
        Ok(())
    }

    fn require_unlocked(&self, operation: Operation) -> Result<(), Fault> {
        match self.state.mode {
            Mode::Unlocked => Ok(()),
            Mode::Locked(_) => Err(self.privilege_fault(operation)),
        }
    }

    fn privilege_fault(&self, operation: Operation) -> Fault {
        let fault = Fault::PrivilegeViolation {
            operation,
            mode: self.state.mode(),
        };
        warn!(%fault, "privileged operation rejected");
        fault
    }
}

impl Default for ProtectionUnit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: u32 = 0x0001_0000;
    const TRUSTED: u32 = 0x0000_1100;
    const RET: u32 = 0x0000_1040;

    fn configured() -> ProtectionUnit {
        let mut unit = ProtectionUnit::new();
        unit.setprotd(SECRET, 4).unwrap();
        unit.setproti(TRUSTED).unwrap();
        unit
    }

    fn inside_routine() -> ProtectionUnit {
        let mut unit = configured();
        assert_eq!(unit.enterprot(RET).unwrap(), TRUSTED);
        unit.admit_fetch(TRUSTED).unwrap();
        unit
    }

    #[test]
    fn test_initial_state() {
        let unit = ProtectionUnit::new();
        assert_eq!(unit.mode(), ModeKind::Unlocked);
        assert_eq!(unit.state().segment(), None);
        assert_eq!(unit.state().entry_pointer(), Ok(None));
        assert_eq!(unit.state().return_address(), None);
        assert!(!unit.state().trusted_routine_active());
    }

    #[test]
    fn test_segment_contains() {
        let s = Segment::new(0x100, 4);
        assert!(!s.contains(0xFF));
        assert!(s.contains(0x100));
        assert!(s.contains(0x103));
        assert!(!s.contains(0x104));
        assert!(!Segment::new(0x100, 0).contains(0x100));
    }

    #[test]
    fn test_segment_at_top_of_address_space() {
        let s = Segment::new(0xFFFF_FFF0, 0x20);
        assert_eq!(s.end(), 0x1_0000_0010);
        assert!(s.contains(0xFFFF_FFFF));
        assert!(!s.contains(0x0000_0000));
    }

    #[test]
    fn test_setproti_setprotd_overwrite() {
        let mut unit = configured();
        unit.setproti(0x2000).unwrap();
        unit.setprotd(0x3000, 16).unwrap();
        assert_eq!(unit.state().entry_pointer(), Ok(Some(0x2000)));
        assert_eq!(unit.state().segment(), Some(Segment::new(0x3000, 16)));
    }

    #[test]
    fn test_unlocked_permits_everything() {
        let unit = configured();
        for kind in [AccessKind::Fetch, AccessKind::Read, AccessKind::Write] {
            assert_eq!(unit.check_access(SECRET, kind), Ok(()));
        }
    }

    #[test]
    fn test_enterprot_locks_and_records_return() {
        let mut unit = configured();
        let next = unit.enterprot(RET).unwrap();
        assert_eq!(next, TRUSTED);
        assert_eq!(unit.mode(), ModeKind::Locked);
        assert_eq!(unit.state().return_address(), Some(RET));
        assert!(unit.state().entry_pending());
        assert!(!unit.state().trusted_routine_active());
    }

    #[test]
    fn test_pending_lock_denies_segment() {
        let mut unit = configured();
        unit.enterprot(RET).unwrap();
        for kind in [AccessKind::Fetch, AccessKind::Read, AccessKind::Write] {
            assert_eq!(
                unit.check_access(SECRET, kind),
                Err(Fault::ProtmemViolation { address: SECRET, kind })
            );
        }
    }

    #[test]
    fn test_trusted_routine_reads_and_writes_segment() {
        let unit = inside_routine();
        assert!(unit.state().trusted_routine_active());
        assert!(unit.state().capability().is_some());
        assert_eq!(unit.check_range(SECRET, 4, AccessKind::Read), Ok(()));
        assert_eq!(unit.check_range(SECRET, 4, AccessKind::Write), Ok(()));
    }

    #[test]
    fn test_check_range_reports_first_protected_byte() {
        let mut unit = configured();
        unit.enterprot(RET).unwrap();
        // [SECRET - 2, SECRET + 2) overlaps the first two protected bytes
        assert_eq!(
            unit.check_range(SECRET - 2, 4, AccessKind::Read),
            Err(Fault::ProtmemViolation {
                address: SECRET,
                kind: AccessKind::Read
            })
        );
        assert_eq!(unit.check_range(SECRET - 4, 4, AccessKind::Read), Ok(()));
        assert_eq!(unit.check_range(SECRET + 4, 16, AccessKind::Write), Ok(()));
        assert_eq!(unit.check_range(SECRET, 0, AccessKind::Write), Ok(()));
        assert_eq!(
            unit.check_range(0, u32::MAX, AccessKind::Write),
            Err(Fault::ProtmemViolation {
                address: SECRET,
                kind: AccessKind::Write
            })
        );
    }

    #[test]
    fn test_locked_outside_segment_permitted() {
        let mut unit = configured();
        unit.enterprot(RET).unwrap();
        assert_eq!(unit.check_access(SECRET + 4, AccessKind::Read), Ok(()));
        assert_eq!(unit.check_access(SECRET - 1, AccessKind::Write), Ok(()));
    }

    #[test]
    fn test_admit_fetch_wrong_pc() {
        let mut unit = configured();
        unit.enterprot(RET).unwrap();
        assert_eq!(
            unit.admit_fetch(TRUSTED + 4),
            Err(Fault::ProtmemViolation {
                address: TRUSTED + 4,
                kind: AccessKind::Fetch
            })
        );
        assert!(unit.state().entry_pending());
    }

    #[test]
    fn test_admit_fetch_noop_when_unlocked_or_active() {
        let mut unit = configured();
        assert_eq!(unit.admit_fetch(0xDEAD_BEEC), Ok(()));

        let mut unit = inside_routine();
        // Branches inside the routine do not revoke trust
        assert_eq!(unit.admit_fetch(0x0000_9000), Ok(()));
        assert!(unit.state().trusted_routine_active());
    }

    #[test]
    fn test_exitprot_unlocks_and_clears_return() {
        let mut unit = inside_routine();
        assert_eq!(unit.exitprot(RET), Ok(RET));
        assert_eq!(unit.mode(), ModeKind::Unlocked);
        assert_eq!(unit.state().return_address(), None);
        assert!(!unit.state().trusted_routine_active());
        // Configuration survives the round trip
        assert_eq!(unit.state().entry_pointer(), Ok(Some(TRUSTED)));
    }

    #[test]
    fn test_exitprot_target_not_compared() {
        let mut unit = inside_routine();
        assert_eq!(unit.exitprot(0x4444), Ok(0x4444));
    }

    #[test]
    fn test_exitprot_unlocked_is_privilege_violation() {
        let mut unit = configured();
        assert_eq!(
            unit.exitprot(RET),
            Err(Fault::PrivilegeViolation {
                operation: Operation::Exitprot,
                mode: ModeKind::Unlocked
            })
        );
    }

    #[test]
    fn test_configuration_changes_rejected_while_locked() {
        let mut unit = inside_routine();
        assert_eq!(
            unit.setprotd(0x5000, 8),
            Err(Fault::PrivilegeViolation {
                operation: Operation::Setprotd,
                mode: ModeKind::Locked
            })
        );
        assert_eq!(
            unit.setproti(0x6000),
            Err(Fault::PrivilegeViolation {
                operation: Operation::Setproti,
                mode: ModeKind::Locked
            })
        );
        assert_eq!(unit.state().segment(), Some(Segment::new(SECRET, 4)));
        unit.exitprot(RET).unwrap();
        assert_eq!(unit.state().entry_pointer(), Ok(Some(TRUSTED)));
    }

    #[test]
    fn test_nested_enterprot_rejected() {
        let mut unit = inside_routine();
        assert_eq!(
            unit.enterprot(0x7777),
            Err(Fault::PrivilegeViolation {
                operation: Operation::Enterprot,
                mode: ModeKind::Locked
            })
        );
        assert_eq!(unit.state().return_address(), Some(RET));
    }

    #[test]
    fn test_entry_pointer_hidden_while_locked() {
        let unit = inside_routine();
        assert_eq!(
            unit.state().entry_pointer(),
            Err(Fault::PrivilegeViolation {
                operation: Operation::ReadEntryPointer,
                mode: ModeKind::Locked
            })
        );
    }

    #[test]
    fn test_enterprot_missing_configuration() {
        let cases: [(Option<u32>, Option<(u32, u32)>, MissingConfig); 4] = [
            (None, None, MissingConfig::Both),
            (Some(TRUSTED), None, MissingConfig::Segment),
            (None, Some((SECRET, 4)), MissingConfig::EntryPointer),
            (Some(TRUSTED), Some((SECRET, 0)), MissingConfig::EmptySegment),
        ];

        for (entry, segment, missing) in cases {
            let mut unit = ProtectionUnit::new();
            if let Some(entry) = entry {
                unit.setproti(entry).unwrap();
            }
            if let Some((base, len)) = segment {
                unit.setprotd(base, len).unwrap();
            }
            assert_eq!(
                unit.enterprot(RET),
                Err(Fault::ConfigurationFault { missing })
            );
            assert_eq!(unit.mode(), ModeKind::Unlocked);
            assert_eq!(unit.state().return_address(), None);
        }
    }

    #[test]
    fn test_reenter_after_exit() {
        let mut unit = inside_routine();
        unit.exitprot(RET).unwrap();
        assert_eq!(unit.enterprot(RET + 8), Ok(TRUSTED));
        assert_eq!(unit.state().return_address(), Some(RET + 8));
        assert!(unit.state().entry_pending());
    }

    #[test]
    fn test_decide_table() {
        let seg = Some(Segment::new(SECRET, 4));
        let k = AccessKind::Read;
        assert_eq!(decide(ModeKind::Unlocked, seg, SECRET, k, false), Ok(()));
        assert_eq!(decide(ModeKind::Unlocked, seg, SECRET, k, true), Ok(()));
        assert_eq!(decide(ModeKind::Locked, seg, SECRET + 8, k, false), Ok(()));
        assert_eq!(decide(ModeKind::Locked, seg, SECRET, k, true), Ok(()));
        assert_eq!(
            decide(ModeKind::Locked, seg, SECRET, k, false),
            Err(Fault::ProtmemViolation { address: SECRET, kind: k })
        );
        assert_eq!(decide(ModeKind::Locked, None, SECRET, k, false), Ok(()));
    }
}
