use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// macOS virtual keycode of F1.
const MAC_KEYCODE_F1: i64 = 122;
/// Command, Control and Option bits of `CGEventFlags`. Shift and Fn are ignored.
const MAC_CHORD_MASK: u64 = 0x00100000 | 0x00040000 | 0x00080000;

/// F1 without a Command/Control/Option chord, so shortcuts like Cmd+F1 stay with the OS.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn is_bare_f1(keycode: i64, flags: u64) -> bool {
    keycode == MAC_KEYCODE_F1 && flags & MAC_CHORD_MASK == 0
}

/// Start a background thread that listens for the global start/stop hotkey F1.
/// Sets `flag` to `true` when the hotkey is pressed.
#[cfg(target_os = "macos")]
pub fn start_hotkey_listener(flag: Arc<AtomicBool>) {
    use std::ffi::c_void;

    type CGEventTapProxy = *mut c_void;
    type CGEventRef = *mut c_void;
    type CFMachPortRef = *mut c_void;
    type CFRunLoopSourceRef = *mut c_void;
    type CFRunLoopRef = *mut c_void;
    type CFStringRef = *const c_void;
    type CGEventMask = u64;
    type CGEventType = u32;
    type CGEventFlags = u64;

    type CGEventTapCallBack = unsafe extern "C" fn(
        CGEventTapProxy,
        CGEventType,
        CGEventRef,
        *mut c_void,
    ) -> CGEventRef;

    const K_CG_HID_EVENT_TAP: u32 = 0;
    const K_CG_HEAD_INSERT_EVENT_TAP: u32 = 0;
    const K_CG_EVENT_TAP_OPTION_LISTEN_ONLY: u32 = 1;
    const CG_EVENT_KEY_DOWN: u32 = 10;

    const K_CG_KEYBOARD_EVENT_KEYCODE: u32 = 9;

    #[link(name = "ApplicationServices", kind = "framework")]
    #[link(name = "CoreFoundation", kind = "framework")]
    extern "C" {
        fn CGEventTapCreate(
            tap: u32,
            place: u32,
            options: u32,
            events_of_interest: CGEventMask,
            callback: CGEventTapCallBack,
            user_info: *mut c_void,
        ) -> CFMachPortRef;

        fn CFMachPortCreateRunLoopSource(
            allocator: *const c_void,
            port: CFMachPortRef,
            order: i64,
        ) -> CFRunLoopSourceRef;

        fn CFRunLoopGetCurrent() -> CFRunLoopRef;
        fn CFRunLoopAddSource(rl: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
        fn CFRunLoopRun();

        fn CGEventGetFlags(event: CGEventRef) -> CGEventFlags;
        fn CGEventGetIntegerValueField(event: CGEventRef, field: u32) -> i64;
        fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);

        static kCFRunLoopCommonModes: CFStringRef;
    }

    unsafe extern "C" fn hotkey_callback(
        _proxy: CGEventTapProxy,
        event_type: CGEventType,
        event: CGEventRef,
        user_info: *mut c_void,
    ) -> CGEventRef {
        unsafe {
            if event_type != CG_EVENT_KEY_DOWN {
                return event;
            }

            let flags = CGEventGetFlags(event);
            let keycode = CGEventGetIntegerValueField(event, K_CG_KEYBOARD_EVENT_KEYCODE);
            if is_bare_f1(keycode, flags) {
                let flag = &*(user_info as *const AtomicBool);
                flag.store(true, Ordering::Release);
            }

            event
        }
    }

    std::thread::spawn(move || unsafe {
        let mask: CGEventMask = 1 << CG_EVENT_KEY_DOWN;
        let flag_ptr = Arc::into_raw(flag) as *mut c_void;

        let tap = CGEventTapCreate(
            K_CG_HID_EVENT_TAP,
            K_CG_HEAD_INSERT_EVENT_TAP,
            K_CG_EVENT_TAP_OPTION_LISTEN_ONLY,
            mask,
            hotkey_callback,
            flag_ptr,
        );

        if tap.is_null() {
            tracing::error!(
                "failed to create event tap for F1, grant Accessibility permission to your terminal"
            );
            let _ = Arc::from_raw(flag_ptr as *const AtomicBool);
            return;
        }

        let source = CFMachPortCreateRunLoopSource(std::ptr::null(), tap, 0);
        let run_loop = CFRunLoopGetCurrent();
        CFRunLoopAddSource(run_loop, source, kCFRunLoopCommonModes);
        CGEventTapEnable(tap, true);
        tracing::info!("global hotkey F1 registered");

        CFRunLoopRun(); // blocks forever
    });
}

/// Start a background thread that listens for the global start/stop hotkey F1 (Windows).
/// Sets `flag` to `true` when the hotkey is pressed.
#[cfg(target_os = "windows")]
pub fn start_hotkey_listener(flag: Arc<AtomicBool>) {
    use std::ffi::c_void;

    type HWND = *mut c_void;
    type BOOL = i32;
    type UINT = u32;
    type WPARAM = usize;
    type LPARAM = isize;
    type DWORD = u32;
    type LONG = i32;

    #[repr(C)]
    struct POINT {
        x: LONG,
        y: LONG,
    }

    #[repr(C)]
    struct MSG {
        hwnd: HWND,
        message: UINT,
        w_param: WPARAM,
        l_param: LPARAM,
        time: DWORD,
        pt: POINT,
    }

    const MOD_NOREPEAT: u32 = 0x4000;
    const VK_F1: u32 = 0x70;
    const WM_HOTKEY: u32 = 0x0312;
    const HOTKEY_ID: i32 = 1;

    #[link(name = "user32")]
    extern "system" {
        fn RegisterHotKey(hwnd: HWND, id: i32, fs_modifiers: UINT, vk: UINT) -> BOOL;
        fn GetMessageW(msg: *mut MSG, hwnd: HWND, msg_filter_min: UINT, msg_filter_max: UINT) -> BOOL;
    }

    std::thread::spawn(move || unsafe {
        if RegisterHotKey(std::ptr::null_mut(), HOTKEY_ID, MOD_NOREPEAT, VK_F1) == 0 {
            tracing::error!("failed to register global hotkey F1, another application may own it");
            return;
        }

        tracing::info!("global hotkey F1 registered");

        let mut msg: MSG = std::mem::zeroed();
        // GetMessageW blocks until a message arrives; returns 0 on WM_QUIT
        while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {
            if msg.message == WM_HOTKEY && msg.w_param == HOTKEY_ID as usize {
                flag.store(true, Ordering::Release);
            }
        }
    });
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn start_hotkey_listener(_flag: Arc<AtomicBool>) {
    tracing::warn!("global hotkey not supported on this platform, use the dashboard keys");
}

/// Consume a pending hotkey press.
pub fn take_press(flag: &AtomicBool) -> bool {
    flag.swap(false, Ordering::AcqRel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unchorded_f1_triggers() {
        assert!(is_bare_f1(122, 0));
        assert!(is_bare_f1(122, 0x00020000)); // shift
        assert!(!is_bare_f1(122, 0x00100000)); // cmd
        assert!(!is_bare_f1(40, 0));
    }

    #[test]
    fn press_is_consumed_once() {
        let flag = AtomicBool::new(true);
        assert!(take_press(&flag));
        assert!(!take_press(&flag));
    }
}
