quantity!(KilowattHourRate, "DKK/kWh");
