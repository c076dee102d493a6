use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::os::fd::AsFd;
use std::ptr::NonNull;

use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};

/// A fixed-size shared-memory cell backing one application's reply slot,
/// named deterministically from its logical id (`/dev/shm/kernelsim-reply-A{id}`)
/// so the kernel (creator) and the app (attacher) agree on it without a
/// side channel. Single-producer/single-consumer: the kernel writes only
/// while the app is suspended, so no locking is needed.
pub struct ReplySlot {
    path: std::path::PathBuf,
    ptr: NonNull<core::ffi::c_void>,
    len: NonZeroUsize,
    owns_file: bool,
}

impl ReplySlot {
    fn path_for(app_id: u32) -> std::path::PathBuf {
        std::path::PathBuf::from(format!("/dev/shm/kernelsim-reply-A{app_id}"))
    }

    /// Create (or truncate) the slot. Called by the kernel at app-spawn time.
    pub fn create(app_id: u32, size: usize) -> nix::Result<Self> {
        let path = Self::path_for(app_id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|_| nix::Error::EIO)?;
        file.set_len(size as u64).map_err(|_| nix::Error::EIO)?;
        let len = NonZeroUsize::new(size).expect("reply slot size must be nonzero");
        let ptr = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(file.as_fd()),
                0,
            )
        }?;
        Ok(Self {
            path,
            ptr,
            len,
            owns_file: true,
        })
    }

    /// Attach to a slot already created by the kernel. Called by the app.
    pub fn open(app_id: u32, size: usize) -> nix::Result<Self> {
        let path = Self::path_for(app_id);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|_| nix::Error::ENOENT)?;
        let len = NonZeroUsize::new(size).expect("reply slot size must be nonzero");
        let ptr = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(file.as_fd()),
                0,
            )
        }?;
        Ok(Self {
            path,
            ptr,
            len,
            owns_file: false,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().cast(), self.len.get()) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr().cast(), self.len.get()) }
    }

    pub fn write(&mut self, data: &[u8]) {
        let n = data.len().min(self.len.get());
        self.as_bytes_mut()[..n].copy_from_slice(&data[..n]);
    }
}

impl Drop for ReplySlot {
    fn drop(&mut self) {
        unsafe {
            let _ = munmap(self.ptr, self.len.get());
        }
        if self.owns_file {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

// Safety: the region is read/written only while the owning app is suspended
// (kernel side) or only by the app itself (app side); no two threads ever
// touch it concurrently.
unsafe impl Send for ReplySlot {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_write_is_visible_to_app_attach() {
        let id = 9001;
        let mut kernel_side = ReplySlot::create(id, 64).unwrap();
        kernel_side.write(b"hello reply");

        let app_side = ReplySlot::open(id, 64).unwrap();
        assert_eq!(&app_side.as_bytes()[..11], b"hello reply");
    }
}
