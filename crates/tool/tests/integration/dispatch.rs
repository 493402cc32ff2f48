use std::cell::Cell;
use std::future::poll_fn;
use std::pin::Pin;
use std::rc::Rc;

use kite_config::ManagerConfig;
use kite_primitives::{BoxFutureLocal, Key, Modifiers, MouseButtons, Point};
use kite_tool::{
	ActionTable, EventAction, EventCategory, EventMatcher, ToolAction, ToolEvent, ToolId, ToolManager, ToolRun, ToolStatus,
};
use pretty_assertions::assert_eq;

use crate::common::{A, B, C, Log, TestTool, harness, harness_with, logging_loop};

#[test]
fn activation_event_starts_matching_tool() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	let select = h
		.manager
		.register_tool(TestTool::<A>::new("select").with_transitions(move |m, id| {
			m.schedule_next_state(
				id,
				EventMatcher::new(EventCategory::COMMAND, EventAction::ACTIVATE),
				logging_loop(&l, "select", EventMatcher::click(MouseButtons::LEFT)),
			);
		}))
		.unwrap();
	h.manager.init_tools();

	let activation = ToolEvent::activate("select");
	assert!(h.manager.process_event(activation.clone()));

	assert_eq!(h.manager.active_tools(), vec![select]);
	assert_eq!(h.manager.tool_status(select), Some(ToolStatus::Waiting));
	assert_eq!(h.manager.initial_event(select), Some(activation));
	assert_eq!(log.entries(), vec!["select start"]);
}

#[test]
fn waiting_tool_resumes_only_on_matching_event() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	let mover = h
		.manager
		.register_tool(TestTool::<A>::new("move").with_transitions(move |m, id| {
			m.schedule_next_state(
				id,
				EventMatcher::activate("move"),
				logging_loop(&l, "move", EventMatcher::mouse(EventAction::MOUSE_CLICK)),
			);
		}))
		.unwrap();
	h.manager.init_tools();
	assert!(h.manager.invoke_tool("move"));

	assert!(!h.manager.process_event(ToolEvent::key(Key::Escape, Modifiers::empty())));
	assert_eq!(h.manager.tool_status(mover), Some(ToolStatus::Waiting));
	assert_eq!(h.manager.wakeup_event(mover), None);

	let click = ToolEvent::click(MouseButtons::LEFT, Point::new(4.0, 2.0));
	assert!(h.manager.process_event(click.clone()));
	assert_eq!(h.manager.wakeup_event(mover), Some(click.clone()));
	assert_eq!(click.first_responder(), Some(mover));
	assert_eq!(log.entries(), vec!["move start", "move click"]);
	assert_eq!(h.manager.tool_status(mover), Some(ToolStatus::Waiting));
}

fn click_waiter(log: &Log, tag: &'static str, pass: Rc<Cell<bool>>) -> impl Fn(ToolRun, ToolEvent) -> BoxFutureLocal<'static, ()> + use<> {
	let log = log.clone();
	move |run: ToolRun, _: ToolEvent| -> BoxFutureLocal<'static, ()> {
		let log = log.clone();
		let pass = pass.clone();
		Box::pin(async move {
			while let Some(event) = run.wait(EventMatcher::click(MouseButtons::ANY)).await {
				log.push(format!("{tag} click"));
				if pass.get() {
					event.pass_event();
				}
			}
		})
	}
}

#[test]
fn front_tool_consumes_event_unless_it_passes() {
	let h = harness();
	let log = Log::default();
	let pass = Rc::new(Cell::new(false));

	let l = log.clone();
	let a = h
		.manager
		.register_tool(TestTool::<A>::new("a").with_transitions(move |m, id| {
			m.schedule_next_state(id, EventMatcher::activate("a"), click_waiter(&l, "a", Rc::default()));
		}))
		.unwrap();
	let l = log.clone();
	let p = pass.clone();
	let b = h
		.manager
		.register_tool(TestTool::<B>::new("b").with_transitions(move |m, id| {
			m.schedule_next_state(id, EventMatcher::activate("b"), click_waiter(&l, "b", p.clone()));
		}))
		.unwrap();
	h.manager.init_tools();

	assert!(h.manager.process_event(ToolEvent::activate("a")));
	assert!(h.manager.process_event(ToolEvent::activate("b")));
	assert_eq!(h.manager.active_tools(), vec![b, a]);

	h.manager.process_event(ToolEvent::click(MouseButtons::LEFT, Point::ORIGIN));
	assert_eq!(log.take(), vec!["b click"]);

	pass.set(true);
	h.manager.process_event(ToolEvent::click(MouseButtons::LEFT, Point::ORIGIN));
	assert_eq!(log.take(), vec!["b click", "a click"]);
}

#[test]
fn messages_reach_every_matching_transition() {
	let h = harness();
	let log = Log::default();

	let record = |tag: &'static str| {
		let l = log.clone();
		move |m: &ToolManager, id: ToolId| {
			let l = l.clone();
			let l2 = l.clone();
			m.schedule_next_state(id, EventMatcher::message("board.changed"), move |_, _| {
				let l = l.clone();
				async move { l.push(tag) }
			});
			m.schedule_next_state(id, EventMatcher::action("edit.redo"), move |_, _| {
				let l = l2.clone();
				async move { l.push(format!("{tag} redo")) }
			});
		}
	};
	let a = h.manager.register_tool(TestTool::<A>::new("a").with_transitions(record("a"))).unwrap();
	h.manager.register_tool(TestTool::<B>::new("b").with_transitions(record("b"))).unwrap();
	h.manager.register_tool(TestTool::<C>::new("c").with_transitions(record("c"))).unwrap();
	h.manager.init_tools();

	let message = ToolEvent::message("board.changed");
	assert!(h.manager.process_event(message.clone()));
	assert_eq!(log.take(), vec!["a", "b", "c"]);
	assert_eq!(message.first_responder(), Some(a));
	assert!(h.manager.active_tools().is_empty());

	assert!(h.manager.process_event(ToolEvent::action("edit.redo")));
	assert_eq!(log.take(), vec!["a redo"]);
}

#[test]
fn first_matching_transition_of_a_tool_wins() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	h.manager
		.register_tool(TestTool::<A>::new("a").with_transitions(move |m, id| {
			let first = l.clone();
			let second = l.clone();
			m.schedule_next_state(id, EventMatcher::action("edit.copy"), move |_, _| {
				let l = first.clone();
				async move { l.push("first") }
			});
			m.schedule_next_state(id, EventMatcher::new(EventCategory::COMMAND, EventAction::ACTION), move |_, _| {
				let l = second.clone();
				async move { l.push("second") }
			});
		}))
		.unwrap();
	h.manager.init_tools();

	h.manager.process_event(ToolEvent::action("edit.copy"));
	h.manager.process_event(ToolEvent::action("edit.paste"));
	assert_eq!(log.entries(), vec!["first", "second"]);
}

#[test]
fn posted_events_drain_in_order_before_returning() {
	let h = harness();
	let log = Log::default();

	h.manager
		.register_tool(TestTool::<A>::new("poster").with_transitions(|m, id| {
			m.schedule_next_state(id, EventMatcher::action("post"), |run, _| async move {
				run.post_event(ToolEvent::message("one"));
				run.post_event(ToolEvent::message("two"));
			});
		}))
		.unwrap();
	let l = log.clone();
	h.manager
		.register_tool(TestTool::<B>::new("listener").with_transitions(move |m, id| {
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::new(EventCategory::MESSAGE, EventAction::NOTIFY), move |run, event| {
				let l = l.clone();
				async move {
					let name = event.command_name().unwrap_or_default().to_owned();
					if name == "one" {
						run.post_event(ToolEvent::message("three"));
					}
					l.push(name);
				}
			});
		}))
		.unwrap();
	h.manager.init_tools();

	h.manager.process_event(ToolEvent::action("post"));
	assert_eq!(log.entries(), vec!["one", "two", "three"]);
	assert_eq!(h.manager.queued_events(), 0);
}

#[test]
fn woken_tool_is_not_also_started_by_the_same_message() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	let tool = h
		.manager
		.register_tool(TestTool::<A>::new("watch").with_transitions(move |m, id| {
			m.schedule_next_state(id, EventMatcher::activate("watch"), {
				let l = l.clone();
				move |run, _| {
					let l = l.clone();
					async move {
						while let Some(event) = run.wait(EventMatcher::message("model.changed")).await {
							l.push("woken");
							event.pass_event();
						}
					}
				}
			});
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::message("model.changed"), move |_, _| {
				let l = l.clone();
				async move { l.push("started") }
			});
		}))
		.unwrap();
	h.manager.init_tools();
	h.manager.invoke_tool("watch");

	h.manager.process_event(ToolEvent::message("model.changed"));
	assert_eq!(log.entries(), vec!["woken"]);
	assert_eq!(h.manager.nested_depth(tool), 0);
}

#[test]
fn behavior_that_never_waits_finishes_inline() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	let tool = h
		.manager
		.register_tool(TestTool::<A>::new("once").with_transitions(move |m, id| {
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("once"), move |_, _| {
				let l = l.clone();
				async move { l.push("ran") }
			});
		}))
		.unwrap();
	h.manager.init_tools();

	assert!(h.manager.invoke_tool(tool));
	assert_eq!(log.entries(), vec!["ran"]);
	assert!(!h.manager.is_tool_active(tool));
	assert_eq!(h.manager.tool_status(tool), Some(ToolStatus::Idle));
}

#[test]
fn second_wait_in_one_frame_resolves_to_none() {
	let h = harness();
	let log = Log::default();
	let l = log.clone();
	let tool = h
		.manager
		.register_tool(TestTool::<A>::new("greedy").with_transitions(move |m, id| {
			let l = l.clone();
			m.schedule_next_state(id, EventMatcher::activate("greedy"), move |run, _| {
				let l = l.clone();
				async move {
					let mut first = run.wait(EventMatcher::any());
					let mut second = run.wait(EventMatcher::any());
					let result = poll_fn(|cx| {
						let _ = Pin::new(&mut first).poll(cx);
						Pin::new(&mut second).poll(cx)
					})
					.await;
					l.push(format!("second: {}", result.is_some()));
				}
			});
		}))
		.unwrap();
	h.manager.init_tools();

	h.manager.invoke_tool("greedy");
	assert_eq!(log.entries(), vec!["second: false"]);
	assert_eq!(h.manager.tool_status(tool), Some(ToolStatus::Idle));
}

#[test]
fn runaway_recursion_is_cut_at_the_depth_limit() {
	let mut actions = ActionTable::new();
	actions.register(ToolAction::new("recurse")).unwrap();
	let config = ManagerConfig {
		max_dispatch_depth: 3,
		..ManagerConfig::default()
	};
	let h = harness_with(config, actions);
	let starts = Rc::new(Cell::new(0));
	let s = starts.clone();
	let tool = h
		.manager
		.register_tool(TestTool::<A>::new("loop").with_transitions(move |m, id| {
			let s = s.clone();
			m.schedule_next_state(id, EventMatcher::action("recurse"), move |run, _| {
				let s = s.clone();
				async move {
					s.set(s.get() + 1);
					run.run_action("recurse", true);
				}
			});
		}))
		.unwrap();
	h.manager.init_tools();

	h.manager.process_event(ToolEvent::action("recurse"));
	assert_eq!(starts.get(), 3);
	assert_eq!(h.manager.nested_depth(tool), 0);
	assert!(h.manager.active_tools().is_empty());
}

#[test]
fn host_ui_is_refreshed_after_each_event() {
	let h = harness();
	h.manager.process_event(ToolEvent::cancel());
	h.manager.process_event(ToolEvent::message("idle"));
	assert_eq!(h.frame.ui_updates.get(), 2);
}
