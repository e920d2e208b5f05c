//! Integration test: an arena sized for a step's worth of scratch
//! serves blocks until the reserved range runs out.

use torque_arena::{ScratchAllocator, ScratchConfig, ScratchError};

const KIB: usize = 1024;

fn one_mib_arena() -> ScratchAllocator {
    ScratchAllocator::from_config(&ScratchConfig::new(64 * KIB, 1024 * KIB))
        .expect("1 MiB reservation")
}

#[test]
fn five_hundred_kib_blocks_fit_in_one_mib() {
    let arena = one_mib_arena();
    for i in 1..=5 {
        let block = arena.allocate(100 * KIB, 16, false).expect("non-empty block");
        assert_eq!(block.len(), 100 * KIB);
        assert_eq!(block.addr() % 16, 0);
        assert!(arena.used() >= i * 100 * KIB);
        assert!(arena.committed() >= arena.used());
        assert!(arena.committed() <= arena.reserved());
    }
}

#[test]
#[should_panic(expected = "scratch allocation")]
fn six_hundred_kib_after_five_hundred_panics() {
    let arena = one_mib_arena();
    for _ in 0..5 {
        arena.allocate(100 * KIB, 16, false);
    }
    arena.allocate(600 * KIB, 16, false);
}

#[test]
fn try_allocate_reports_what_is_left() {
    let arena = one_mib_arena();
    for _ in 0..5 {
        arena.try_allocate(100 * KIB, 16, false).unwrap();
    }
    match arena.try_allocate(600 * KIB, 16, false) {
        Err(ScratchError::CapacityExceeded {
            requested,
            available,
        }) => {
            assert_eq!(requested, 600 * KIB);
            assert!(available < 600 * KIB);
            assert!(available >= arena.reserved() - arena.used() - 16);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn reset_reclaims_the_whole_range() {
    let mut arena = one_mib_arena();
    for _ in 0..5 {
        arena.allocate(100 * KIB, 16, true);
    }
    arena.reset(false);
    assert_eq!(arena.used(), 0);
    let big = arena.allocate(900 * KIB, 16, true).expect("fits after reset");
    assert!(big.iter().all(|&b| b == 0));
}
