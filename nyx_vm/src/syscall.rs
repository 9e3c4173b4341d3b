//! The syscall table and the OS-facing syscall bodies.
//!
//! The index arrives in `q15`; arguments and results travel in general
//! registers per the ABI below. The fd quartet goes straight to the host
//! OS through `libc`; `malloc`/`free` manage dynamic blocks on the MMU;
//! `exit` terminates the host process.
//!
//! | idx  | name   | inputs                                   | outputs |
//! |------|--------|------------------------------------------|---------|
//! | 0x00 | open   | `q0` path ptr, `d1` flags, `w2` mode     | `q0` fd |
//! | 0x01 | close  | `d0` fd                                  | —       |
//! | 0x02 | read   | `d0` fd, `q1` buffer, `q2` count         | `q0` n  |
//! | 0x03 | write  | `d0` fd, `q1` buffer, `q2` count         | `q0` n  |
//! | 0x04 | malloc | `q0` size                                | `q0` addr |
//! | 0x05 | free   | `q0` addr                                | —       |
//! | 0xFF | exit   | `b0` status                              | does not return |

use crate::error::{VmError, VmResult};
use crate::vm::Vm;
use nyx_core::{DataSize, Immediate, Register};
use rustc_hash::FxHashMap;
use std::ffi::CString;

/// A native syscall body.
pub type SyscallFn = fn(&mut Vm) -> VmResult<()>;

/// Index → body mapping.
pub type SyscallTable = FxHashMap<usize, SyscallFn>;

/// `open` index.
pub const SYS_OPEN: usize = 0x00;
/// `close` index.
pub const SYS_CLOSE: usize = 0x01;
/// `read` index.
pub const SYS_READ: usize = 0x02;
/// `write` index.
pub const SYS_WRITE: usize = 0x03;
/// `malloc` index.
pub const SYS_MALLOC: usize = 0x04;
/// `free` index.
pub const SYS_FREE: usize = 0x05;
/// `exit` index.
pub const SYS_EXIT: usize = 0xFF;

/// Build the standard syscall table.
#[must_use]
pub fn standard_syscalls() -> SyscallTable {
    let mut table = SyscallTable::default();
    table.insert(SYS_OPEN, sys_open as SyscallFn);
    table.insert(SYS_CLOSE, sys_close as SyscallFn);
    table.insert(SYS_READ, sys_read as SyscallFn);
    table.insert(SYS_WRITE, sys_write as SyscallFn);
    table.insert(SYS_MALLOC, sys_malloc as SyscallFn);
    table.insert(SYS_FREE, sys_free as SyscallFn);
    table.insert(SYS_EXIT, sys_exit as SyscallFn);
    table
}

/// Read the NUL-terminated path at `addr` out of VM memory.
fn read_path(vm: &Vm, addr: usize) -> VmResult<CString> {
    let mut bytes = Vec::new();
    let mut cursor = addr;
    loop {
        let byte = vm.mmu.read(cursor, DataSize::Byte)?.as_u8();
        if byte == 0 {
            break;
        }
        bytes.push(byte);
        cursor += 1;
    }
    // Interior NULs are impossible by construction.
    Ok(CString::new(bytes).expect("NUL-free bytes"))
}

fn sys_open(vm: &mut Vm) -> VmResult<()> {
    let path_addr = vm.regs.get(Register::Q0).as_usize();
    let flags = vm.regs.get(Register::D1).as_u32() as i32;
    let mode = libc::c_uint::from(vm.regs.get(Register::W2).as_u16());

    let path = read_path(vm, path_addr)?;

    let fd = unsafe { libc::open(path.as_ptr(), flags, mode) };
    if fd < 0 {
        return Err(VmError::Io(std::io::Error::last_os_error()));
    }

    vm.regs.set(Register::Q0, Immediate::QWord(fd as u64));
    Ok(())
}

fn sys_close(vm: &mut Vm) -> VmResult<()> {
    let fd = vm.regs.get(Register::D0).as_u32() as i32;

    let ret = unsafe { libc::close(fd) };
    if ret < 0 {
        return Err(VmError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

fn sys_read(vm: &mut Vm) -> VmResult<()> {
    let fd = vm.regs.get(Register::D0).as_u32() as i32;
    let addr = vm.regs.get(Register::Q1).as_usize();
    let count = vm.regs.get(Register::Q2).as_usize();

    // Validate the destination range before touching the OS.
    if addr.checked_add(count).map_or(true, |end| end > vm.mmu.size()) {
        return Err(VmError::AddressOutOfBounds(addr));
    }

    let mut buffer = vec![0u8; count];
    let n = unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), count) };
    if n < 0 {
        return Err(VmError::Io(std::io::Error::last_os_error()));
    }

    vm.mmu.write_bytes(addr, &buffer[..n as usize])?;
    vm.regs.set(Register::Q0, Immediate::QWord(n as u64));
    Ok(())
}

fn sys_write(vm: &mut Vm) -> VmResult<()> {
    let fd = vm.regs.get(Register::D0).as_u32() as i32;
    let addr = vm.regs.get(Register::Q1).as_usize();
    let count = vm.regs.get(Register::Q2).as_usize();

    let buffer = vm.mmu.read_bytes(addr, count)?;

    let n = unsafe { libc::write(fd, buffer.as_ptr().cast(), count) };
    if n < 0 {
        return Err(VmError::Io(std::io::Error::last_os_error()));
    }

    vm.regs.set(Register::Q0, Immediate::QWord(n as u64));
    Ok(())
}

fn sys_malloc(vm: &mut Vm) -> VmResult<()> {
    let size = vm.regs.get(Register::Q0).as_usize();
    let base = vm.mmu.add_block("heap", size);
    vm.regs.set(Register::Q0, Immediate::QWord(base as u64));
    Ok(())
}

fn sys_free(vm: &mut Vm) -> VmResult<()> {
    let addr = vm.regs.get(Register::Q0).as_usize();
    vm.mmu.free_block(addr, Vm::FIXED_BLOCKS)
}

fn sys_exit(vm: &mut Vm) -> VmResult<()> {
    let status = vm.regs.get(Register::B0).as_u8();
    std::process::exit(i32::from(status));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_contents() {
        let table = standard_syscalls();
        for index in [
            SYS_OPEN, SYS_CLOSE, SYS_READ, SYS_WRITE, SYS_MALLOC, SYS_FREE, SYS_EXIT,
        ] {
            assert!(table.contains_key(&index), "missing syscall {index:#x}");
        }
        assert!(!table.contains_key(&0x06));
    }
}
