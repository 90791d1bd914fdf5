//! The robot side of the VM: connection lifecycle plus one method per
//! native action.

use tangle_types::NativeAction;

/// Native action vocabulary driven by the VM.
///
/// Action methods should return quickly with a status code, `0` on success.
/// The VM reports non-zero codes but does not interpret them. The touch
/// sensor query is answered by the VM's [`TouchSensor`](crate::TouchSensor),
/// not by the actuator.
pub trait Actuator {
    fn is_connected(&self) -> bool;
    fn set_address(&mut self, address: &str);
    fn open_connection(&mut self);
    fn close_connection(&mut self);
    /// Halt all motion immediately.
    fn all_stop(&mut self);

    fn walk(&mut self, args: &[i32]) -> i32;
    fn run(&mut self, args: &[i32]) -> i32;
    fn jump(&mut self, args: &[i32]) -> i32;
    fn spin(&mut self, args: &[i32]) -> i32;
    fn wiggle(&mut self, args: &[i32]) -> i32;
    fn sleep(&mut self, args: &[i32]) -> i32;
    fn yawn(&mut self, args: &[i32]) -> i32;
    fn stand(&mut self, args: &[i32]) -> i32;
    fn end(&mut self, args: &[i32]) -> i32;
    fn dance(&mut self, args: &[i32]) -> i32;
    /// Announce a wait: `1` for tap, `1000` for forever, else a count.
    fn do_wait(&mut self, args: &[i32]) -> i32;

    /// Route an action to its method. Returns `None` for the sensor query.
    fn dispatch(&mut self, action: NativeAction, args: &[i32]) -> Option<i32> {
        Some(match action {
            NativeAction::Walk => self.walk(args),
            NativeAction::Run => self.run(args),
            NativeAction::Jump => self.jump(args),
            NativeAction::Spin => self.spin(args),
            NativeAction::Wiggle => self.wiggle(args),
            NativeAction::Sleep => self.sleep(args),
            NativeAction::Yawn => self.yawn(args),
            NativeAction::Stand => self.stand(args),
            NativeAction::End => self.end(args),
            NativeAction::Dance => self.dance(args),
            NativeAction::Wait => self.do_wait(args),
            NativeAction::TouchSensor => return None,
        })
    }
}
