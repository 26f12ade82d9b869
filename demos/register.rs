use dnssd_registrar::{
	engine::{local::LocalEngineBuilder, RegistrationEngine},
	register::{RegisterRequestBuilder, TxtRecord},
	registrar::Registrar,
};

fn main() {
	let (reply_tx, reply_rx) = std::sync::mpsc::sync_channel(1);

	let engine = LocalEngineBuilder::new()
		.default_name("HELLO-WORLD")
		.build()
		.run_background()
		.unwrap();

	let txt = TxtRecord::from_pairs([("txtvers", "1"), ("protovers", "3")]).unwrap();

	let service = engine.register_with(
		RegisterRequestBuilder::new("_oca._tcp", 65000)
			.unwrap()
			.txt(txt.clone())
			.build()
			.unwrap(),
		move |reply| {
			reply_tx.try_send(reply.to_owned()).ok();
		},
	);

	println!("Waiting for {service} to be registered...");

	println!("{:#?}", reply_rx.recv().unwrap());

	println!("Registering the same name again through a Registrar...");

	let registrar = Registrar::new(engine);
	let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
	let registration = runtime
		.block_on(registrar.register(
			RegisterRequestBuilder::new("_oca._tcp", 65001)
				.unwrap()
				.name("HELLO-WORLD")
				.txt(txt)
				.build()
				.unwrap(),
		))
		.unwrap();

	println!("Renamed to {:?}", registration.name());

	println!("Shutting down...");

	registrar.deregister(registration.service());
	registrar.engine().deregister(service);
	drop(registrar);

	println!("Done!");
}
