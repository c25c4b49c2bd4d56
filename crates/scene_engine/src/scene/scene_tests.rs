//! Frame-level scenarios for the scene graph driven through the renderer

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::foundation::math::{Point3, Rotation};
    use crate::render::device::{CompileMode, DeviceCall, GraphicsDevice, ListHandle};
    use crate::render::{Camera, Frustum, RecordingDevice, Renderer, ViewVolume, Viewport};
    use crate::tree::{Branch, Leaf};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn compiled_at(device: &mut RecordingDevice, name: &str, x: f32, z: f32) -> SceneObject {
        let mut object = SceneObject::new(name).placed(Point3::new(x, 0.0, z), Rotation::IDENTITY);
        object.compile_with(device, CompileMode::Compile, |_| Ok(())).unwrap();
        object
    }

    fn list_of(object: &SceneObject) -> ListHandle {
        object.draw_list().compiled().unwrap()
    }

    fn invoked_lists(device: &RecordingDevice) -> Vec<ListHandle> {
        device
            .calls()
            .iter()
            .filter_map(|call| match call {
                DeviceCall::CallList(list) => Some(*list),
                _ => None,
            })
            .collect()
    }

    fn golden_camera() -> Camera {
        Camera::new("golden", Frustum::new(60.0, 5.0, 60.0).unwrap())
    }

    /// Three compiled children at x = -20, 0, +50, ten units ahead of the origin
    fn golden_scene(device: &mut RecordingDevice) -> (Scene, [ListHandle; 3]) {
        let mut scene = Scene::new("golden");
        let left = compiled_at(device, "left", -20.0, -10.0);
        let middle = compiled_at(device, "middle", 0.0, -10.0);
        let right = compiled_at(device, "right", 50.0, -10.0);
        let lists = [list_of(&left), list_of(&middle), list_of(&right)];
        scene.add_node(left).unwrap();
        scene.add_node(middle).unwrap();
        scene.add_node(right).unwrap();
        (scene, lists)
    }

    struct FrameLog(Rc<RefCell<Vec<u64>>>);

    impl Behavior for FrameLog {
        fn apply(&mut self, _node: &NodeTransform, frame: &FrameContext) {
            self.0.borrow_mut().push(frame.frame);
        }
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let first = SceneObject::new("first");
        let scene = Scene::new("between");
        let second = NodeBase::new("second");
        let mut device = RecordingDevice::new();
        let fog = Fog::new(
            &mut device,
            crate::render::device::FogMode::Exp,
            0.5,
            1.0..=10.0,
            crate::foundation::math::Color::new(0.5, 0.5, 0.5, 1.0),
        )
        .unwrap();

        let ids = [first.id(), scene.id(), second.id(), fog.id()];

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids.iter().all(|id| id.get() > 0));
    }

    struct Marker {
        base: NodeBase,
    }

    impl SceneNode for Marker {
        fn base(&self) -> &NodeBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut NodeBase {
            &mut self.base
        }

        fn draw(&mut self, _device: &mut dyn GraphicsDevice, _frame: &FrameContext) -> crate::render::RenderResult<DrawOutcome> {
            Ok(DrawOutcome::Drawn)
        }
    }

    #[test]
    fn test_node_built_from_copied_base_is_distinct() {
        let mut scene = Scene::new("copies");
        let first = Marker { base: NodeBase::new("marker") };
        let second = Marker { base: first.base.clone() };
        let (first_id, second_id) = (first.id(), second.id());

        scene.add_node(first).unwrap();
        assert!(scene.add_node(second).is_ok());

        assert_eq!(scene.count(), 2);
        assert!(second_id > first_id);
        assert_eq!(scene.node(second_id).map(|node| node.base().parent()), Some(Some(scene.id())));
    }

    #[test]
    fn test_golden_frame_with_square_window() {
        let mut device = RecordingDevice::new();
        let (mut scene, lists) = golden_scene(&mut device);
        let camera = golden_camera();
        device.clear_trace();

        let report = scene.draw(&mut device, &ViewVolume::new(&camera, 1.0), &FrameContext::default()).unwrap();

        // x = +50: |d| = sqrt(2600) ~ 50.99, half height ~ 58.88, so it stays in view
        assert_eq!(report.drawn.len(), 3);
        assert!(report.culled.is_empty());
        assert_eq!(invoked_lists(&device), lists.to_vec());
        assert_eq!(device.count_calls(|call| matches!(call, DeviceCall::Rotate(..))), 0);
        // The only translations are the children's own placements
        assert_eq!(device.count_calls(|call| matches!(call, DeviceCall::Translate(_))), 3);
        assert_eq!(device.calls()[0], DeviceCall::LoadIdentity);
        assert!(matches!(device.calls()[1], DeviceCall::PushMatrix));
    }

    #[test]
    fn test_golden_frame_with_tall_window() {
        let mut device = RecordingDevice::new();
        let (mut scene, lists) = golden_scene(&mut device);
        let camera = golden_camera();
        device.clear_trace();

        // height / width = 0.5 halves the horizontal tolerance:
        // x = -20 has half width ~ 12.91 and x = +50 has ~ 29.44
        let report = scene.draw(&mut device, &ViewVolume::new(&camera, 0.5), &FrameContext::default()).unwrap();

        assert_eq!(report.drawn.len(), 1);
        assert_eq!(report.culled.len(), 2);
        assert_eq!(invoked_lists(&device), vec![lists[1]]);
        assert_eq!(scene.count(), 3);
    }

    #[test]
    fn test_insertion_order_survives_culling() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("ordered");
        let mut expected = Vec::new();
        for (i, x) in [3.0, -900.0, 1.0, 900.0, -2.0].into_iter().enumerate() {
            let object = compiled_at(&mut device, &format!("n{}", i), x, -20.0);
            if x.abs() < 100.0 {
                expected.push(list_of(&object));
            }
            scene.add_node(object).unwrap();
        }
        let camera = Camera::new("wide", Frustum::default());
        device.clear_trace();

        let report = scene.draw(&mut device, &ViewVolume::new(&camera, 1.0), &FrameContext::default()).unwrap();

        assert_eq!(invoked_lists(&device), expected);
        let order: Vec<NodeId> = scene.children().iter().map(|node| node.id()).collect();
        let mut drawn_in_order = order.clone();
        drawn_in_order.retain(|id| report.drawn.contains(id));
        assert_eq!(report.drawn, drawn_in_order);
        assert_eq!(report.culled, vec![order[1], order[3]]);
    }

    #[test]
    fn test_stack_depth_restored_for_any_child_count() {
        let never = |_: &dyn SceneNode| false;
        for count in [0_usize, 1, 7] {
            let mut device = RecordingDevice::new();
            let mut scene = Scene::with_transform("world", Point3::new(1.0, 2.0, 3.0), Rotation::from_euler_degrees(10.0, 0.0, 0.0));
            for i in 0..count {
                let mut object = compiled_at(&mut device, "child", i as f32, 0.0);
                object.set_rotation(Rotation::from_euler_degrees(0.0, 45.0, 0.0));
                scene.add_node(object).unwrap();
            }
            let depth = device.matrix_depth();

            let report = scene.draw(&mut device, &never, &FrameContext::default()).unwrap();

            assert_eq!(report.drawn.len(), count);
            assert_eq!(device.matrix_depth(), depth);
        }
    }

    #[test]
    fn test_failing_child_does_not_disturb_siblings() {
        let never = |_: &dyn SceneNode| false;
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("world");
        let before = compiled_at(&mut device, "before", 1.0, 0.0);
        let broken = compiled_at(&mut device, "broken", 2.0, 0.0);
        let after = compiled_at(&mut device, "after", 3.0, 0.0);
        let broken_id = broken.id();
        device.fail_list(list_of(&broken));
        let healthy = [list_of(&before), list_of(&after)];
        scene.add_node(before).unwrap();
        scene.add_node(broken).unwrap();
        scene.add_node(after).unwrap();
        let depth = device.matrix_depth();
        device.clear_trace();

        let report = scene.draw(&mut device, &never, &FrameContext::default()).unwrap();

        assert_eq!(report.drawn.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, broken_id);
        assert!(!report.is_clean());
        assert_eq!(device.matrix_depth(), depth);
        let pushes = device.count_calls(|call| matches!(call, DeviceCall::PushMatrix));
        let pops = device.count_calls(|call| matches!(call, DeviceCall::PopMatrix));
        assert_eq!((pushes, pops), (3, 3));
        let lists = invoked_lists(&device);
        assert_eq!(lists.first(), Some(&healthy[0]));
        assert_eq!(lists.last(), Some(&healthy[1]));
    }

    #[test]
    fn test_uncompiled_and_hidden_children_skip() {
        let never = |_: &dyn SceneNode| false;
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new("world");
        let bare = SceneObject::new("bare");
        let mut hidden = compiled_at(&mut device, "hidden", 0.0, 0.0);
        hidden.base_mut().set_visible(false);
        let ids = [bare.id(), hidden.id()];
        scene.add_node(bare).unwrap();
        scene.add_node(hidden).unwrap();
        device.clear_trace();

        let report = scene.draw(&mut device, &never, &FrameContext::default()).unwrap();

        assert_eq!(report.skipped, ids.to_vec());
        assert_eq!(device.calls(), &[DeviceCall::LoadIdentity]);
    }

    #[test]
    fn test_begin_twice_finalizes_once() {
        let mut device = RecordingDevice::new();
        let mut object = SceneObject::new("recompiled");

        object.begin(&mut device, CompileMode::Compile, true).unwrap();
        object.end(&mut device).unwrap();
        let first = object.draw_list().handle().unwrap();
        object.begin(&mut device, CompileMode::Compile, true).unwrap();
        object.end(&mut device).unwrap();
        let second = object.draw_list().handle().unwrap();

        assert_ne!(first, second);
        assert_eq!(device.count_calls(|call| *call == DeviceCall::DeleteList(first)), 1);
        assert_eq!(device.count_calls(|call| matches!(call, DeviceCall::DeleteList(_))), 1);
        let delete_at = device.calls().iter().position(|call| *call == DeviceCall::DeleteList(first));
        let gen_at = device.calls().iter().position(|call| *call == DeviceCall::GenList(second));
        assert!(delete_at < gen_at);
        assert_eq!(device.live_lists(), 1);
    }

    #[test]
    fn test_renderer_frames_reach_behaviors() {
        let mut device = RecordingDevice::new();
        let mut renderer = Renderer::new(Viewport::new(640, 640).unwrap());
        let mut scene = Scene::new("stage");
        let frames = Rc::new(RefCell::new(Vec::new()));
        let mut actor = compiled_at(&mut device, "actor", 0.0, -20.0);
        actor.add_behavior(Box::new(FrameLog(Rc::clone(&frames))));
        let actor_id = actor.id();
        scene.add_node(actor).unwrap();
        let key = renderer.add_scene(scene);
        renderer.attach_camera(Camera::new("main", Frustum::default()).viewing(key), true);

        for _ in 0..3 {
            let report = renderer.render_frame(&mut device).unwrap().unwrap();
            assert_eq!(report.drawn, vec![actor_id]);
        }

        assert_eq!(*frames.borrow(), vec![1, 2, 3]);
        assert_eq!(renderer.frame_count(), 3);
        assert_eq!(device.clear_count(), 3);
        assert_eq!(device.modelview_depth(), 1);
    }

    #[test]
    fn test_renderer_culls_with_active_camera() {
        let mut device = RecordingDevice::new();
        let mut renderer = Renderer::new(Viewport::new(100, 100).unwrap());
        let (scene, lists) = golden_scene(&mut device);
        let key = renderer.add_scene(scene);
        renderer.attach_camera(golden_camera().viewing(key), true);
        device.clear_trace();

        let square = renderer.draw(&mut device).unwrap().unwrap();
        assert_eq!(square.drawn.len(), 3);

        renderer.resize(&mut device, 200, 100).unwrap();
        device.clear_trace();
        let tall = renderer.draw(&mut device).unwrap().unwrap();

        assert_eq!(tall.drawn.len(), 1);
        assert_eq!(invoked_lists(&device), vec![lists[1]]);
    }

    #[test]
    fn test_removed_node_is_no_longer_drawn() {
        let mut device = RecordingDevice::new();
        let mut renderer = Renderer::new(Viewport::new(100, 100).unwrap());
        let (scene, lists) = golden_scene(&mut device);
        let middle_id = scene.children()[1].id();
        let key = renderer.add_scene(scene);
        renderer.attach_camera(golden_camera().viewing(key), true);

        let mut removed = renderer.scene_mut(key).unwrap().remove_node(middle_id).unwrap();
        device.clear_trace();
        let report = renderer.draw(&mut device).unwrap().unwrap();

        assert_eq!(report.drawn.len(), 2);
        assert!(!invoked_lists(&device).contains(&lists[1]));
        removed.release(&mut device).unwrap();
        assert_eq!(device.live_lists(), 2);
    }

    #[test]
    fn test_scene_release_frees_everything() {
        let mut device = RecordingDevice::new();
        let (mut scene, _) = golden_scene(&mut device);
        let mut light = Light::in_slot(crate::render::device::LightSlot::new(0).unwrap());
        light.set_enabled(&mut device, true).unwrap();
        scene.add_node(light).unwrap();

        scene.release(&mut device).unwrap();

        assert_eq!(device.live_lists(), 0);
        assert_eq!(scene.count(), 0);
    }
}
