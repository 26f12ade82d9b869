use dnssd_registrar::{
	engine::{
		local::{LocalEngineBuilder, LocalEngineHandle},
		RegistrationEngine,
	},
	errors::{DnsServiceError, ErrorClass},
	flags::ServiceFlags,
	register::{OwnedRegisterReply, RegisterRequestBuilder},
	registrar::Registrar,
};
use std::{
	sync::mpsc::{channel, Receiver},
	time::Duration,
};

const TIMEOUT: Duration = Duration::from_secs(10);

fn init_logger() {
	simple_logger::SimpleLogger::new().with_level(log::LevelFilter::Debug).init().ok();
}

fn engine() -> LocalEngineHandle {
	init_logger();
	LocalEngineBuilder::new()
		.default_name("Studio")
		.build()
		.run_background()
		.expect("Failed to start local engine")
}

fn register(engine: &LocalEngineHandle, request: RegisterRequestBuilder) -> (dnssd_registrar::register::ServiceRef, Receiver<OwnedRegisterReply>) {
	let (tx, rx) = channel();
	let service = engine.register_with(request.build().unwrap(), move |reply| {
		println!("Got reply {reply:?}");
		tx.send(reply.to_owned()).ok();
	});
	(service, rx)
}

#[test]
fn printer_round_trip() {
	let engine = engine();

	let (service, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_ipp._tcp", 631)
			.unwrap()
			.name("Printer")
			.domain("local")
			.unwrap()
			.add_txt("txtvers", "1")
			.unwrap(),
	);

	let reply = rx.recv_timeout(TIMEOUT).expect("Timed out waiting for reply");
	assert_eq!(reply.service, service);
	assert_eq!(reply.result, Ok(()));
	assert_eq!(reply.class(), ErrorClass::Success);
	assert!(reply.flags.contains(ServiceFlags::ADD));
	assert!(!reply.flags.contains(ServiceFlags::MORE_COMING));
	assert_eq!(reply.name, "Printer");
	assert_eq!(reply.regtype, "_ipp._tcp");
	assert_eq!(reply.domain, "local.");

	// Exactly one reply for a registration that does not watch for conflicts.
	assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

	assert!(engine.deregister(service));
	assert!(!engine.deregister(service));

	engine.shutdown().unwrap();
}

#[test]
fn defaults_fill_in_missing_fields() {
	let engine = engine();

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name(""));

	let reply = rx.recv_timeout(TIMEOUT).expect("Timed out waiting for reply");
	assert_eq!(reply.result, Ok(()));
	assert_eq!(reply.name, "Studio");
	assert_eq!(reply.regtype, "_oca._tcp");
	assert_eq!(reply.domain, "local.");
}

#[test]
fn replies_are_correlated_with_their_requests() {
	let engine = engine();

	let (first, first_rx) = register(&engine, RegisterRequestBuilder::new("_http._tcp", 80).unwrap().name("Web A"));
	let (second, second_rx) = register(&engine, RegisterRequestBuilder::new("_http._tcp", 8080).unwrap().name("Web B"));
	assert_ne!(first, second);

	let first_reply = first_rx.recv_timeout(TIMEOUT).unwrap();
	let second_reply = second_rx.recv_timeout(TIMEOUT).unwrap();

	assert_eq!(first_reply.service, first);
	assert_eq!(first_reply.name, "Web A");
	assert_eq!(second_reply.service, second);
	assert_eq!(second_reply.name, "Web B");
}

#[test]
fn collisions_are_renamed() {
	let engine = engine();

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().name, "Printer");

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 632).unwrap().name("printer"));
	let reply = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(reply.result, Ok(()));
	assert_eq!(reply.name, "printer (2)");

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 633).unwrap().name("Printer"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().name, "Printer (3)");

	// Same name, different type: no collision.
	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_http._tcp", 80).unwrap().name("Printer"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().name, "Printer");
}

#[test]
fn conflicts_can_be_retried_from_the_reply() {
	let engine = engine();

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name("Speaker"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Ok(()));

	let (service, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65001).unwrap().name("Speaker").no_auto_rename(),
	);
	let conflict = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(conflict.service, service);
	assert_eq!(conflict.result, Err(DnsServiceError::NameConflict));
	assert_eq!(conflict.class(), ErrorClass::NameCollision);

	// Everything needed for the retry comes from the failed reply.
	let (_, rx) = register(
		&engine,
		RegisterRequestBuilder::new(&conflict.regtype, 65001)
			.unwrap()
			.name(format!("{} (2)", conflict.name))
			.domain(&conflict.domain)
			.unwrap()
			.no_auto_rename(),
	);
	let retried = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(retried.result, Ok(()));
	assert_eq!(retried.name, "Speaker (2)");
}

#[test]
fn unavailable_engine_reports_through_the_handler() {
	init_logger();
	let engine = LocalEngineBuilder::new().unavailable().build().run_background().unwrap();

	let (service, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer"));

	let reply = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(reply.service, service);
	assert_eq!(reply.result, Err(DnsServiceError::ServiceNotRunning));
	assert_eq!(reply.class(), ErrorClass::EngineUnavailable);
	assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn watched_registrations_hear_about_renames() {
	let engine = engine();

	let (service, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name("Mixer").watch_conflicts(),
	);

	let registered = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(registered.result, Ok(()));
	assert_eq!(registered.name, "Mixer");
	assert_eq!(registered.flags, ServiceFlags::ADD | ServiceFlags::MORE_COMING);

	assert!(engine.announce_conflict(service));
	let renamed = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(renamed.service, service);
	assert_eq!(renamed.result, Ok(()));
	assert_eq!(renamed.name, "Mixer (2)");

	assert!(engine.deregister(service));
	let removed = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(removed.result, Ok(()));
	assert_eq!(removed.flags, ServiceFlags::NONE);
	assert_eq!(removed.name, "Mixer (2)");

	assert!(!engine.announce_conflict(service));
	assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn conflict_without_rename_ends_the_registration() {
	let engine = engine();

	let (service, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65000)
			.unwrap()
			.name("Amp")
			.no_auto_rename()
			.watch_conflicts(),
	);
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Ok(()));

	assert!(engine.announce_conflict(service));
	let conflict = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(conflict.result, Err(DnsServiceError::NameConflict));
	assert_eq!(conflict.name, "Amp");

	// The name is free again.
	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_oca._tcp", 65001).unwrap().name("Amp"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().name, "Amp");
}

#[test]
fn shutdown_completes() {
	let engine = engine();

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer"));
	rx.recv_timeout(TIMEOUT).unwrap();

	let (tx, done_rx) = channel();
	std::thread::spawn(move || {
		tx.send(engine.shutdown()).ok();
	});

	done_rx
		.recv_timeout(TIMEOUT)
		.expect("Timed out waiting for engine to shut down")
		.unwrap();
}

#[tokio::test]
async fn registrar_waits_for_the_first_reply() {
	let registrar = Registrar::new(engine());

	let registration = registrar
		.register(RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer").build().unwrap())
		.await
		.unwrap();

	assert_eq!(registration.name(), "Printer");
	assert_eq!(registration.regtype(), "_ipp._tcp");
	assert_eq!(registration.domain(), "local.");
	assert_eq!(registrar.registrations(), [registration.clone()]);

	let renamed = registrar
		.register(RegisterRequestBuilder::new("_ipp._tcp", 632).unwrap().name("Printer").build().unwrap())
		.await
		.unwrap();
	assert_eq!(renamed.name(), "Printer (2)");
	assert_eq!(registrar.registrations().len(), 2);

	assert!(registrar.deregister(registration.service()));
	assert!(!registrar.deregister(registration.service()));
	assert_eq!(registrar.registrations(), [renamed]);
}

#[tokio::test]
async fn registrar_reports_errors() {
	let registrar = Registrar::new(engine());

	registrar
		.register(RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name("Speaker").build().unwrap())
		.await
		.unwrap();

	let err = registrar
		.register(
			RegisterRequestBuilder::new("_oca._tcp", 65001)
				.unwrap()
				.name("Speaker")
				.no_auto_rename()
				.build()
				.unwrap(),
		)
		.await
		.unwrap_err();
	assert_eq!(err, DnsServiceError::NameConflict);
	assert_eq!(registrar.registrations().len(), 1);

	init_logger();
	let unavailable = Registrar::new(LocalEngineBuilder::new().unavailable().build().run_background().unwrap());
	let err = unavailable
		.register(RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().build().unwrap())
		.await
		.unwrap_err();
	assert_eq!(err, DnsServiceError::ServiceNotRunning);
	assert!(unavailable.registrations().is_empty());
}

#[test]
fn panicking_handler_does_not_stop_the_engine() {
	let engine = engine();

	let (panicked_tx, panicked_rx) = channel();
	let first = engine.register_with(
		RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer").build().unwrap(),
		move |reply| {
			panicked_tx.send(reply.to_owned()).ok();
			panic!("handler failure");
		},
	);
	assert_eq!(panicked_rx.recv_timeout(TIMEOUT).unwrap().result, Ok(()));

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 632).unwrap().name("Scanner"));
	let reply = rx.recv_timeout(TIMEOUT).unwrap();
	assert_eq!(reply.result, Ok(()));
	assert_eq!(reply.name, "Scanner");

	// The first registration survived its handler and still holds the name.
	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_ipp._tcp", 633).unwrap().name("Printer"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().name, "Printer (2)");

	assert!(engine.deregister(first));
	engine.shutdown().unwrap();
}

#[test]
fn failed_registrations_are_forgotten() {
	let engine = engine();

	let (_, rx) = register(&engine, RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name("Speaker"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Ok(()));

	let (conflicting, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65001).unwrap().name("Speaker").no_auto_rename(),
	);
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Err(DnsServiceError::NameConflict));
	assert!(!engine.deregister(conflicting));
	assert!(!engine.announce_conflict(conflicting));

	let (watched, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65002)
			.unwrap()
			.name("Amp")
			.no_auto_rename()
			.watch_conflicts(),
	);
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Ok(()));
	assert!(engine.announce_conflict(watched));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Err(DnsServiceError::NameConflict));
	assert!(!engine.deregister(watched));

	init_logger();
	let unavailable = LocalEngineBuilder::new().unavailable().build().run_background().unwrap();
	let (service, rx) = register(&unavailable, RegisterRequestBuilder::new("_ipp._tcp", 631).unwrap().name("Printer"));
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().result, Err(DnsServiceError::ServiceNotRunning));
	assert!(!unavailable.deregister(service));
}

#[test]
fn shutdown_ends_watched_registrations() {
	let engine = engine();

	let (service, rx) = register(
		&engine,
		RegisterRequestBuilder::new("_oca._tcp", 65000).unwrap().name("Mixer").watch_conflicts(),
	);
	assert_eq!(rx.recv_timeout(TIMEOUT).unwrap().flags, ServiceFlags::ADD | ServiceFlags::MORE_COMING);

	engine.shutdown().unwrap();

	let last = rx.recv_timeout(TIMEOUT).expect("Timed out waiting for the final reply");
	assert_eq!(last.service, service);
	assert_eq!(last.result, Err(DnsServiceError::ServiceNotRunning));
	assert_eq!(last.class(), ErrorClass::EngineUnavailable);
	assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[tokio::test]
async fn registrar_follows_renames() {
	let registrar = Registrar::new(engine());

	let registration = registrar
		.register(
			RegisterRequestBuilder::new("_oca._tcp", 65000)
				.unwrap()
				.name("Mixer")
				.watch_conflicts()
				.build()
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(registration.name(), "Mixer");

	assert!(registrar.engine().announce_conflict(registration.service()));

	let deadline = tokio::time::Instant::now() + TIMEOUT;
	while registrar.registrations().first().map(|registration| registration.name().to_owned()).as_deref() != Some("Mixer (2)") {
		assert!(tokio::time::Instant::now() < deadline, "Timed out waiting for the rename");
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	assert!(registrar.deregister(registration.service()));
	assert!(registrar.registrations().is_empty());
}
